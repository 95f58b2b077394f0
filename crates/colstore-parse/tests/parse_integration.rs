use colstore_parse::{ASTNodeType, parse};

#[test]
fn integration_nested_calls_and_groups() {
    let ast = parse("sqrt((x - mean(x))^2) / stdev(x)").unwrap();
    match &ast.node_type {
        ASTNodeType::BinaryOp { op, .. } => assert_eq!(op, "/"),
        other => panic!("unexpected root {other}"),
    }
    let names: Vec<&str> = ast.variables().into_iter().collect();
    assert_eq!(names, vec!["x"]);
}

#[test]
fn integration_error_positions_point_into_source() {
    let err = parse("x + * y").unwrap_err();
    assert_eq!(err.position, Some(4));

    let err = parse("sin(x").unwrap_err();
    assert!(err.position.is_some());
}

#[test]
fn integration_whitespace_is_insignificant() {
    assert_eq!(
        parse("2 * x").unwrap().to_string(),
        parse("2*x").unwrap().to_string()
    );
    assert_eq!(
        parse(" sma ( 3 , x ) ").unwrap().to_string(),
        "Function(sma, Number(3), Variable(x))"
    );
}
