use super::ConditionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Compare(CompareOp),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ConditionError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, ch) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, consumed) = match ch {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '=' if next == Some('=') => (Token::Compare(CompareOp::Eq), 2),
            '=' => (Token::Compare(CompareOp::Eq), 1),
            '!' if next == Some('=') => (Token::Compare(CompareOp::Ne), 2),
            '!' => (Token::Not, 1),
            '<' if next == Some('>') => (Token::Compare(CompareOp::Ne), 2),
            '<' if next == Some('=') => (Token::Compare(CompareOp::Le), 2),
            '<' => (Token::Compare(CompareOp::Lt), 1),
            '>' if next == Some('=') => (Token::Compare(CompareOp::Ge), 2),
            '>' => (Token::Compare(CompareOp::Gt), 1),
            '&' if next == Some('&') => (Token::And, 2),
            '|' if next == Some('|') => (Token::Or, 2),
            '\'' | '"' => {
                let (text, consumed) = read_string(&chars, i, offset)?;
                (Token::Str(text), consumed)
            }
            '-' if next.is_some_and(|c| c.is_ascii_alphabetic()) => {
                let word = read_word(&chars, i + 1);
                let token = dash_operator(&word).ok_or_else(|| ConditionError::Syntax {
                    offset,
                    message: format!("unknown operator '-{word}'"),
                })?;
                (token, word.chars().count() + 1)
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '.') && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                read_number(&chars, i, offset)?
            }
            c if is_ident_start(c) => {
                let word = read_word(&chars, i);
                let consumed = word.chars().count();
                (keyword_or_ident(word), consumed)
            }
            other => {
                return Err(ConditionError::Syntax {
                    offset,
                    message: format!("unexpected character '{other}'"),
                })
            }
        };

        tokens.push(Spanned { token, offset });
        i += consumed;
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn read_word(chars: &[(usize, char)], start: usize) -> String {
    let mut word = String::new();
    for (index, (_, c)) in chars.iter().enumerate().skip(start) {
        let accepted = if index == start {
            is_ident_start(*c)
        } else {
            is_ident_continue(*c)
        };
        if !accepted {
            break;
        }
        word.push(*c);
    }
    word
}

fn read_string(
    chars: &[(usize, char)],
    start: usize,
    offset: usize,
) -> Result<(String, usize), ConditionError> {
    let quote = chars[start].1;
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            // A doubled quote inside the literal stands for the quote itself.
            if chars.get(i + 1).map(|(_, n)| *n) == Some(quote) {
                text.push(quote);
                i += 2;
                continue;
            }
            return Ok((text, i - start + 1));
        }
        text.push(c);
        i += 1;
    }

    Err(ConditionError::Syntax {
        offset,
        message: "unterminated string literal".to_string(),
    })
}

fn read_number(
    chars: &[(usize, char)],
    start: usize,
    offset: usize,
) -> Result<(Token, usize), ConditionError> {
    let mut literal = String::new();
    let mut i = start;
    if chars[i].1 == '-' {
        literal.push('-');
        i += 1;
    }
    while let Some((_, c)) = chars.get(i) {
        if c.is_ascii_digit() || *c == '.' {
            literal.push(*c);
            i += 1;
        } else {
            break;
        }
    }

    let at = |index: usize| chars.get(index).map(|(_, c)| *c);
    if matches!(at(i), Some('e' | 'E')) {
        let digits_from = if matches!(at(i + 1), Some('+' | '-')) { i + 2 } else { i + 1 };
        if at(digits_from).is_some_and(|c| c.is_ascii_digit()) {
            literal.extend(chars[i..digits_from].iter().map(|(_, c)| *c));
            i = digits_from;
            while let Some(c) = at(i).filter(char::is_ascii_digit) {
                literal.push(c);
                i += 1;
            }
        }
    }

    let value = literal
        .parse::<f64>()
        .map_err(|_| ConditionError::Syntax {
            offset,
            message: format!("invalid number '{literal}'"),
        })?;
    Ok((Token::Number(value), i - start))
}

fn dash_operator(word: &str) -> Option<Token> {
    let token = match word.to_ascii_lowercase().as_str() {
        "eq" => Token::Compare(CompareOp::Eq),
        "ne" => Token::Compare(CompareOp::Ne),
        "gt" => Token::Compare(CompareOp::Gt),
        "ge" => Token::Compare(CompareOp::Ge),
        "lt" => Token::Compare(CompareOp::Lt),
        "le" => Token::Compare(CompareOp::Le),
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => return None,
    };
    Some(token)
}

fn keyword_or_ident(word: String) -> Token {
    match word.to_ascii_lowercase().as_str() {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" | "$true" => Token::True,
        "false" | "$false" => Token::False,
        "null" | "$null" => Token::Null,
        _ => Token::Ident(word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("tokenizes")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn symbolic_and_powershell_operators_agree() {
        assert_eq!(kinds("A >= 3"), kinds("A -ge 3"));
        assert_eq!(kinds("A != 'x'"), kinds("A -ne 'x'"));
        assert_eq!(kinds("A && B || !C"), kinds("A -and B -or -not C"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("x AND y or NOT z"),
            vec![
                Token::Ident("x".to_string()),
                Token::And,
                Token::Ident("y".to_string()),
                Token::Or,
                Token::Not,
                Token::Ident("z".to_string()),
            ]
        );
        assert_eq!(kinds("$TRUE"), vec![Token::True]);
    }

    #[test]
    fn dotted_identifiers_and_negative_numbers() {
        assert_eq!(
            kinds("Replication.MaxLag > -1.5"),
            vec![
                Token::Ident("Replication.MaxLag".to_string()),
                Token::Compare(CompareOp::Gt),
                Token::Number(-1.5),
            ]
        );
    }

    #[test]
    fn numbers_accept_exponents() {
        assert_eq!(kinds("1e5"), vec![Token::Number(100_000.0)]);
        assert_eq!(kinds("2.5E-3"), vec![Token::Number(0.0025)]);
        assert_eq!(kinds("-4e+2"), vec![Token::Number(-400.0)]);
        assert_eq!(
            kinds("Bytes > 1e9"),
            vec![
                Token::Ident("Bytes".to_string()),
                Token::Compare(CompareOp::Gt),
                Token::Number(1e9),
            ]
        );
    }

    #[test]
    fn a_bare_exponent_marker_is_not_part_of_the_number() {
        assert_eq!(
            kinds("1 -eq 1"),
            vec![
                Token::Number(1.0),
                Token::Compare(CompareOp::Eq),
                Token::Number(1.0),
            ]
        );
        assert_eq!(
            kinds("3e"),
            vec![Token::Number(3.0), Token::Ident("e".to_string())]
        );
    }

    #[test]
    fn doubled_quotes_escape_inside_strings() {
        assert_eq!(kinds("'it''s'"), vec![Token::Str("it's".to_string())]);
    }

    #[test]
    fn unterminated_strings_are_rejected() {
        assert!(matches!(
            tokenize("Status == 'Failed"),
            Err(ConditionError::Syntax { offset: 10, .. })
        ));
    }

    #[test]
    fn stray_characters_are_rejected() {
        assert!(tokenize("A # B").is_err());
        assert!(tokenize("A -foo B").is_err());
    }
}
