use crate::{
    add_host_function,
    runtime::{
        data_structures::{scope::Scope, value::Value},
        error,
    },
};
use std::{cell::RefCell, io::Write, rc::Rc};

/// Where `print` sends its output.  Standard output for the command line, a buffer for tests and
/// embedders that want to capture what a program printed.
pub type OutputSink = Rc<RefCell<dyn Write>>;

/// An output sink that writes to the process's standard output.
pub fn stdout_sink() -> OutputSink {
    Rc::new(RefCell::new(std::io::stdout()))
}

/// Write the value and a newline to the sink.
///
/// Signature: `value -- none`
fn word_print(output: &OutputSink, input: Option<Value>) -> error::Result<Value> {
    let mut output = output.borrow_mut();

    match input {
        Some(value) => writeln!(output, "{}", value)?,
        None => writeln!(output)?,
    }

    output.flush()?;
    Ok(Value::None)
}

/// Register the words that talk to the outside world.
pub fn register_io_words(root: &Scope, output: OutputSink) -> error::Result<()> {
    add_host_function!(
        root,
        "print",
        move |input: Option<Value>| word_print(&output, input),
        "Write a value and a new line to the output."
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::value_list::ValueList;

    #[test]
    fn print_writes_display_form_and_returns_none() {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let output: OutputSink = buffer.clone();

        let list = ValueList::from(vec![Value::Int(1), Value::String("a".to_string())]);

        assert_eq!(word_print(&output, Some(Value::String("hi".to_string()))).unwrap(), Value::None);
        word_print(&output, Some(Value::List(list))).unwrap();
        word_print(&output, None).unwrap();

        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "hi\n[ 1, \"a\" ]\n\n");
    }
}
