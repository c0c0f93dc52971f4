/// Words that do arithmetic over numbers and lists of numbers.
mod simple_arithmetic_words;

/// Words that work with truth values and equality.
mod logic_words;

use crate::runtime::{
    built_ins::base_words::{
        logic_words::register_logic_words,
        simple_arithmetic_words::register_simple_arithmetic_words,
    },
    data_structures::scope::Scope,
    error,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(root: &Scope) -> error::Result<()> {
    register_simple_arithmetic_words(root)?;
    register_logic_words(root)?;

    Ok(())
}
