use crate::{
    lang::{
        code::{Code, FunctionBody, Instruction, Op},
        source_buffer::SourceLocation,
        tokenizing::{Lexer, Operator, Token, TokenKind, TokenSource},
    },
    runtime::{
        data_structures::value::Value,
        error::{self, ErrorKind, ScriptError},
    },
};
use iceoryx2_bb_log::trace;
use std::rc::Rc;

/// Options that change how token streams are turned into callable units.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct BuildOptions {
    /// Reject unknown tokens and unbalanced groups instead of quietly skipping them.
    pub strict: bool,
}

/// Builds callable units straight from a token stream.  Each `( ... )` group becomes its own
/// nested unit and the code around it gets an instruction to push a closure over it.
pub struct FunctionBuilder<'a> {
    tokens: &'a mut dyn TokenSource,
    options: BuildOptions,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(tokens: &'a mut dyn TokenSource, options: BuildOptions) -> FunctionBuilder<'a> {
        FunctionBuilder { tokens, options }
    }

    /// Build the top level unit, consuming tokens up to the end of input.
    pub fn build(&mut self, location: SourceLocation) -> error::Result<Rc<FunctionBody>> {
        self.build_body(location, false)
    }

    fn build_body(
        &mut self,
        location: SourceLocation,
        nested: bool,
    ) -> error::Result<Rc<FunctionBody>> {
        let mut code = Code::new();

        while let Some(token) = self.tokens.next_token()? {
            let op = match token.kind() {
                TokenKind::Int(value) => Op::PushValue(Value::Int(*value)),
                TokenKind::Float(value) => Op::PushValue(Value::Float(*value)),
                TokenKind::String(value) => Op::PushValue(Value::String(value.clone())),
                TokenKind::Bool(value) => Op::PushValue(Value::Bool(*value)),
                TokenKind::Void => Op::PushValue(Value::void()),
                TokenKind::Symbol(name) => Op::PushValue(Value::String(name.clone())),

                TokenKind::Operator(Operator::OpenGroup) => {
                    Op::PushClosure(self.build_body(token.location().clone(), true)?)
                }

                TokenKind::Operator(Operator::CloseGroup) => {
                    if !nested && self.options.strict {
                        return parse_error(&token, "Unexpected ) outside of any group.");
                    }

                    return Ok(finish_body(code, location));
                }

                TokenKind::Operator(operator) => operator_op(*operator),

                TokenKind::Unknown(character) => {
                    if self.options.strict {
                        return parse_error(
                            &token,
                            &format!("Unknown token '{}'.", character),
                        );
                    }

                    trace!("Skipping unknown token {:?}.", token);
                    continue;
                }
            };

            code.push(Instruction::new(token.location().clone(), op));
        }

        if nested && self.options.strict {
            return ScriptError::new_as_result(
                ErrorKind::Parse,
                Some(location),
                "Missing ) for this group.".to_string(),
            );
        }

        Ok(finish_body(code, location))
    }
}

/// A unit ending in a force leaves that force to the caller's trampoline.
fn finish_body(mut code: Code, location: SourceLocation) -> Rc<FunctionBody> {
    let tail_force = match code.last() {
        Some(instruction) if instruction.op == Op::Force => {
            code.pop().map(|instruction| instruction.location)
        }
        _ => None,
    };

    Rc::new(FunctionBody::new(code, tail_force, location))
}

/// The instruction for every operator other than the grouping characters.
fn operator_op(operator: Operator) -> Op {
    match operator {
        Operator::Concat => Op::Concat,
        Operator::NewList => Op::NewList,
        Operator::Push => Op::Push,
        Operator::Pop => Op::Pop,
        Operator::Bind => Op::Bind,
        Operator::Rebind => Op::Rebind,
        Operator::Lookup => Op::Lookup,
        Operator::Compose => Op::Compose,
        Operator::Map => Op::Map,
        Operator::Reduce => Op::Reduce,
        Operator::Force => Op::Force,
        Operator::Catch => Op::Catch,
        Operator::Input => Op::Input,
        Operator::Load => Op::Load,
        Operator::Access => Op::Access,
        Operator::Clear => Op::Clear,

        Operator::OpenGroup | Operator::CloseGroup => {
            unreachable!("Grouping characters are handled by the builder.")
        }
    }
}

fn parse_error<T>(token: &Token, message: &str) -> error::Result<T> {
    ScriptError::new_as_result(
        ErrorKind::Parse,
        Some(token.location().clone()),
        message.to_string(),
    )
}

/// Build any token source into its top level unit.
pub fn build(
    tokens: &mut dyn TokenSource,
    location: SourceLocation,
    options: BuildOptions,
) -> error::Result<Rc<FunctionBody>> {
    FunctionBuilder::new(tokens, options).build(location)
}

/// Lex and build source text in one pass.
pub fn build_from_source(
    path: &str,
    source: &str,
    options: BuildOptions,
) -> error::Result<Rc<FunctionBody>> {
    let mut lexer = Lexer::new(path, source);

    build(&mut lexer, SourceLocation::new_from_path(path), options)
}
