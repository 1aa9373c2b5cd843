use log::debug;

use crate::arena_regex::{Re, RegexStorage};
use crate::SyntaxError;

/// Entries of the operator stack. Postfix operators never land here: they
/// bind tightest and are applied as soon as they are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    /// An open parenthesis, at this byte position.
    Group(usize),
    Or,
    Concat,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Group(_) => 0,
            Operator::Or => 1,
            Operator::Concat => 2,
        }
    }
}

/// Operator-precedence parser from infix pattern syntax to nodes in a
/// [`RegexStorage`].
///
/// Syntax: literal bytes match themselves, adjacency concatenates, `|`
/// alternates, postfix `*`, `+` and `?` repeat, parentheses group and `\`
/// makes the next byte literal. An empty branch or group stands for the empty
/// string.
pub struct Parser<'a> {
    storage: &'a RegexStorage<'a>,
    operands: Vec<Re<'a>>,
    operators: Vec<Operator>,
    /// The operand just completed, if the next one would concatenate with it.
    /// Always the top of `operands` when set.
    previous: Option<Re<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(storage: &'a RegexStorage<'a>) -> Self {
        Self {
            storage,
            operands: Vec::new(),
            operators: Vec::new(),
            previous: None,
        }
    }

    pub fn parse(mut self, pattern: &str) -> Result<Re<'a>, SyntaxError> {
        let mut bytes = pattern.bytes().enumerate();
        while let Some((pos, c)) = bytes.next() {
            match c {
                b'\\' => match bytes.next() {
                    Some((_, escaped)) => self.push_literal(escaped)?,
                    None => return Err(SyntaxError::DanglingEscape { pos }),
                },
                b'(' => self.open_group(pos)?,
                b')' => self.close_group(pos)?,
                b'*' | b'+' | b'?' => self.repeat(c, pos)?,
                b'|' => {
                    self.end_branch();
                    self.reduce(Operator::Or)?;
                    self.operators.push(Operator::Or);
                    self.previous = None;
                }
                _ => self.push_literal(c)?,
            }
        }
        let root = self.finish()?;
        debug!("parsed {:?} as {}", pattern, root);
        Ok(root)
    }

    fn push_literal(&mut self, c: u8) -> Result<(), SyntaxError> {
        self.join_previous()?;
        let literal = self.storage.literal(c);
        self.operands.push(literal);
        self.previous = Some(literal);
        Ok(())
    }

    /// Queues an implicit concatenation if an operand precedes the one about
    /// to be read.
    fn join_previous(&mut self) -> Result<(), SyntaxError> {
        if self.previous.is_some() {
            self.reduce(Operator::Concat)?;
            self.operators.push(Operator::Concat);
        }
        Ok(())
    }

    fn open_group(&mut self, pos: usize) -> Result<(), SyntaxError> {
        self.join_previous()?;
        self.operators.push(Operator::Group(pos));
        self.previous = None;
        Ok(())
    }

    fn close_group(&mut self, pos: usize) -> Result<(), SyntaxError> {
        self.end_branch();
        loop {
            match self.operators.pop() {
                Some(Operator::Group(_)) => break,
                Some(operator) => self.apply(operator)?,
                None => return Err(SyntaxError::UnmatchedClose { pos }),
            }
        }
        self.previous = self.operands.last().copied();
        Ok(())
    }

    fn repeat(&mut self, op: u8, pos: usize) -> Result<(), SyntaxError> {
        let operand = match self.previous {
            Some(operand) => operand,
            None => {
                return Err(SyntaxError::NothingToRepeat {
                    op: op as char,
                    pos,
                })
            }
        };
        self.operands.pop();

        let storage = self.storage;
        let repeated = match op {
            b'*' => storage.star(operand),
            b'+' => storage.concat(operand, storage.star(operand)),
            _ => storage.or(storage.epsilon(), operand),
        };
        self.operands.push(repeated);
        self.previous = Some(repeated);
        Ok(())
    }

    /// A branch that ended before any operand was read matches the empty string.
    fn end_branch(&mut self) {
        if self.previous.is_none() {
            self.operands.push(self.storage.epsilon());
        }
    }

    /// Applies every pending operator that binds at least as tightly as `next`.
    fn reduce(&mut self, next: Operator) -> Result<(), SyntaxError> {
        while let Some(&top) = self.operators.last() {
            if top.precedence() < next.precedence() {
                break;
            }
            self.operators.pop();
            self.apply(top)?;
        }
        Ok(())
    }

    fn apply(&mut self, operator: Operator) -> Result<(), SyntaxError> {
        let right = self.pop_operand()?;
        let left = self.pop_operand()?;
        let result = match operator {
            Operator::Or => self.storage.or(left, right),
            Operator::Concat => self.storage.concat(left, right),
            Operator::Group(pos) => return Err(SyntaxError::UnclosedGroup { pos }),
        };
        self.operands.push(result);
        Ok(())
    }

    fn pop_operand(&mut self) -> Result<Re<'a>, SyntaxError> {
        self.operands.pop().ok_or(SyntaxError::Malformed)
    }

    fn finish(mut self) -> Result<Re<'a>, SyntaxError> {
        self.end_branch();
        while let Some(operator) = self.operators.pop() {
            if let Operator::Group(pos) = operator {
                return Err(SyntaxError::UnclosedGroup { pos });
            }
            self.apply(operator)?;
        }
        match self.operands.as_slice() {
            [root] => Ok(*root),
            _ => Err(SyntaxError::Malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegexContents;
    use std::ptr;

    fn parse_str<'a>(storage: &'a RegexStorage<'a>, pattern: &str) -> Re<'a> {
        Parser::new(storage).parse(pattern).unwrap()
    }

    #[test]
    fn precedence() {
        let storage = RegexStorage::new();

        assert_eq!(parse_str(&storage, "ab|c").to_string(), "ab|c");
        assert_eq!(parse_str(&storage, "a|bc").to_string(), "a|bc");
        assert_eq!(parse_str(&storage, "ab*").to_string(), "ab*");
        assert_eq!(parse_str(&storage, "(ab)*").to_string(), "(ab)*");
        assert_eq!(parse_str(&storage, "(a|b)c").to_string(), "(a|b)c");
        assert_eq!(parse_str(&storage, "a(b|c)").to_string(), "a(b|c)");
    }

    #[test]
    fn concatenation_is_left_associative() {
        let storage = RegexStorage::new();
        let abc = parse_str(&storage, "abc");

        match abc.contents() {
            RegexContents::Concat(ab, c) => {
                assert!(matches!(ab.contents(), RegexContents::Concat(..)));
                assert!(matches!(c.contents(), RegexContents::Literal(b'c')));
            }
            other => panic!("expected concatenation, got {:?}", other),
        }
    }

    #[test]
    fn postfix_operators() {
        let storage = RegexStorage::new();

        let star = parse_str(&storage, "a*");
        assert!(matches!(star.contents(), RegexContents::Star(_)));

        let plus = parse_str(&storage, "a+");
        match plus.contents() {
            RegexContents::Concat(one, more) => match more.contents() {
                RegexContents::Star(inner) => assert!(ptr::eq(one, inner)),
                other => panic!("expected star, got {:?}", other),
            },
            other => panic!("expected concatenation, got {:?}", other),
        }

        let optional = parse_str(&storage, "a?");
        match optional.contents() {
            RegexContents::Or(none, one) => {
                assert!(ptr::eq(none, storage.epsilon()));
                assert!(matches!(one.contents(), RegexContents::Literal(b'a')));
            }
            other => panic!("expected alternation, got {:?}", other),
        }
    }

    #[test]
    fn escapes() {
        let storage = RegexStorage::new();

        assert_eq!(parse_str(&storage, "\\*").to_string(), "\\*");
        assert_eq!(parse_str(&storage, "\\\\").to_string(), "\\\\");
        assert_eq!(parse_str(&storage, "\\(a\\)").to_string(), "\\(a\\)");
        assert!(matches!(
            parse_str(&storage, "\\n").contents(),
            RegexContents::Literal(b'n')
        ));
    }

    #[test]
    fn other_metacharacters_are_literal() {
        let storage = RegexStorage::new();

        for pattern in &[".", "[", "]", "{", "}", "^", "$"] {
            let regex = parse_str(&storage, pattern);
            assert!(matches!(regex.contents(), RegexContents::Literal(_)));
        }
    }

    #[test]
    fn empty_branches() {
        let storage = RegexStorage::new();

        assert!(ptr::eq(parse_str(&storage, ""), storage.epsilon()));
        assert!(ptr::eq(parse_str(&storage, "()"), storage.epsilon()));
        assert_eq!(parse_str(&storage, "(a|)").to_string(), "a|ε");
        assert_eq!(parse_str(&storage, "|a").to_string(), "ε|a");
    }

    #[test]
    fn errors() {
        let storage = RegexStorage::new();
        let parse = |pattern: &str| Parser::new(&storage).parse(pattern);

        assert_eq!(
            parse("*a").unwrap_err(),
            SyntaxError::NothingToRepeat { op: '*', pos: 0 }
        );
        assert_eq!(
            parse("a|+").unwrap_err(),
            SyntaxError::NothingToRepeat { op: '+', pos: 2 }
        );
        assert_eq!(
            parse("(?)").unwrap_err(),
            SyntaxError::NothingToRepeat { op: '?', pos: 1 }
        );
        assert_eq!(
            parse("(a|b").unwrap_err(),
            SyntaxError::UnclosedGroup { pos: 0 }
        );
        assert_eq!(
            parse("a)").unwrap_err(),
            SyntaxError::UnmatchedClose { pos: 1 }
        );
        assert_eq!(
            parse("ab\\").unwrap_err(),
            SyntaxError::DanglingEscape { pos: 2 }
        );
    }
}
