use crate::nn::GraphError;
use crate::{assert_err, assert_panic};

#[test]
fn test_assert_panic_macro() {
    assert_panic!(panic!("test panic"));
    assert_panic!(panic!("custom test panic msg"), "custom test panic msg");
}

#[test]
fn test_assert_err_macro() {
    let duplicate: Result<(), GraphError> = Err(GraphError::DuplicateName("dense".to_string()));
    assert_err!(duplicate);
    assert_err!(duplicate, GraphError::DuplicateName("dense"));
    assert_err!(duplicate, GraphError::DuplicateName(name) if name.starts_with("de"));

    let count: Result<(), GraphError> = Err(GraphError::InputCount {
        expected: 3,
        got: 2,
    });
    assert_err!(count, GraphError::InputCount(3, 2));
    assert_err!(count, GraphError::InputCount { .. });
}
