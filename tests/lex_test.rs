use stlogic::lang::{lex, Literal, Operator, Token, Word};

fn tokens(s: &str) -> Vec<Token> {
    lex(s).into_iter().map(|s| s.token).collect()
}

fn token(s: &str) -> Option<Token> {
    tokens(s).into_iter().next()
}

#[test]
fn test_eq_gt() {
    let v = tokens("1<=>=<>2");
    let mut x = v.iter();
    assert_eq!(x.next(), Some(&Token::Literal(Literal::Integer(1))));
    assert_eq!(x.next(), Some(&Token::Operator(Operator::LessEqual)));
    assert_eq!(x.next(), Some(&Token::Operator(Operator::GreaterEqual)));
    assert_eq!(x.next(), Some(&Token::Operator(Operator::NotEqual)));
    assert_eq!(x.next(), Some(&Token::Literal(Literal::Integer(2))));
    assert_eq!(x.next(), None);
}

#[test]
fn test_keywords_ignore_case() {
    assert_eq!(token("end_if"), Some(Token::Word(Word::EndIf)));
    assert_eq!(token("Var_Input"), Some(Token::Word(Word::VarInput)));
    assert_eq!(token("mod"), Some(Token::Operator(Operator::Modulo)));
    assert_eq!(token("true"), Some(Token::Literal(Literal::Bool(true))));
    assert_eq!(token("counter"), Some(Token::Ident("COUNTER".to_string())));
}

#[test]
fn test_based_literals() {
    assert_eq!(token("16#FF"), Some(Token::Literal(Literal::Integer(255))));
    assert_eq!(token("0x1f"), Some(Token::Literal(Literal::Integer(31))));
    assert_eq!(token("2#1010"), Some(Token::Literal(Literal::Integer(10))));
    assert_eq!(token("8#17"), Some(Token::Literal(Literal::Integer(15))));
    assert_eq!(token("1_000"), Some(Token::Literal(Literal::Integer(1000))));
    assert_eq!(token("2#102"), Some(Token::Unknown("2#102".to_string())));
}

#[test]
fn test_reals() {
    assert_eq!(token("1.5"), Some(Token::Literal(Literal::Real(1.5))));
    assert_eq!(token("2.5E3"), Some(Token::Literal(Literal::Real(2500.0))));
    assert_eq!(token("1e-2"), Some(Token::Literal(Literal::Real(0.01))));
}

#[test]
fn test_range_is_not_a_real() {
    let v = tokens("1..5");
    assert_eq!(
        v,
        vec![
            Token::Literal(Literal::Integer(1)),
            Token::Range,
            Token::Literal(Literal::Integer(5)),
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let v = tokens("x (* block\n comment *) := // line\n 1;");
    assert_eq!(
        v,
        vec![
            Token::Ident("X".to_string()),
            Token::Assign,
            Token::Literal(Literal::Integer(1)),
            Token::Semicolon,
        ]
    );
}

#[test]
fn test_unterminated_comment() {
    assert_eq!(token("(* never closed"), Some(Token::Unknown("(*".to_string())));
}

#[test]
fn test_positions() {
    let v = lex("a := 1;\n  IF b THEN");
    assert_eq!(v[0].line, 1);
    assert_eq!(v[0].column, 0..1);
    assert_eq!(v[1].column, 2..4);
    assert_eq!(v[4].line, 2);
    assert_eq!(v[4].column, 2..4);
    assert_eq!(v[4].token, Token::Word(Word::If));
}
