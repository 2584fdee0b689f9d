//! Request/response model and method dispatch.
//!
//! The transport hands every decoded JSON value to this module and writes
//! back whatever [`Response`] it gets. Nothing here touches a socket.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;
use crate::eval::Evaluator;

/// The input was not valid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// Valid JSON, but not a request object.
pub const INVALID_REQUEST: i64 = -32600;
pub const INVALID_PARAMS: i64 = -32602;
/// The expression itself could not be parsed.
pub const EXPRESSION_ERROR: i64 = -32001;
pub const EVALUATION_ERROR: i64 = -32002;

pub const EVALUATE: &str = "evaluate";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Request {
        Request {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Accepts JSON objects only; missing fields take their defaults.
    pub fn from_value(value: Value) -> Result<Request, ErrorObject> {
        if !value.is_object() {
            return Err(ErrorObject::new(
                INVALID_REQUEST,
                "request must be a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| ErrorObject::new(INVALID_REQUEST, format!("invalid request: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> ErrorObject {
        ErrorObject {
            code,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ErrorObject {
    fn from(err: CoreError) -> ErrorObject {
        let code = match err {
            CoreError::Parse(_) => EXPRESSION_ERROR,
            CoreError::Eval(_) => EVALUATION_ERROR,
        };
        ErrorObject::new(code, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// Serialized as `{"id": .., "result": ..}` or `{"id": .., "error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Response {
        Response {
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Value, error: ErrorObject) -> Response {
        Response {
            id,
            outcome: Outcome::Error(error),
        }
    }

    /// Reply to input that could not be decoded at all; there is no id to
    /// echo back.
    pub fn malformed(err: &serde_json::Error) -> Response {
        Response::error(
            Value::Null,
            ErrorObject::new(PARSE_ERROR, format!("malformed JSON: {}", err)),
        )
    }
}

/// Decodes a request out of an arbitrary JSON value and dispatches it.
pub fn handle_value(value: Value, evaluator: &Evaluator) -> Response {
    // keep the id around for the error reply if the request is malformed
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match Request::from_value(value) {
        Ok(request) => dispatch(request, evaluator),
        Err(err) => Response::error(id, err),
    }
}

/// Runs one request. `evaluate` goes through the evaluator; every other
/// method echoes its params back.
///
/// ```
/// # use lambda_calc_rpc::eval::Evaluator;
/// # use lambda_calc_rpc::rpc::{dispatch, Request, Response};
/// # use serde_json::json;
/// let request = Request::new(1, "ping", json!({"a": 1}));
/// let response = dispatch(request, &Evaluator::new());
/// assert_eq!(response, Response::success(json!(1), json!({"a": 1})));
/// ```
///
pub fn dispatch(request: Request, evaluator: &Evaluator) -> Response {
    let Request { id, method, params } = request;
    match method.as_str() {
        EVALUATE => match evaluate(&params, evaluator) {
            Ok(result) => Response::success(id, result),
            Err(err) => {
                debug!("request {} failed: {}", id, err.message);
                Response::error(id, err)
            }
        },
        _ => Response::success(id, params),
    }
}

fn evaluate(params: &Value, evaluator: &Evaluator) -> Result<Value, ErrorObject> {
    let params = params
        .as_object()
        .ok_or_else(|| ErrorObject::new(INVALID_PARAMS, "params must be an object"))?;
    let expression = match params.get("expression") {
        Some(Value::String(expression)) => expression,
        Some(_) => {
            return Err(ErrorObject::new(
                INVALID_PARAMS,
                "`expression` must be a string",
            ))
        }
        None => {
            return Err(ErrorObject::new(
                INVALID_PARAMS,
                "missing `expression` parameter",
            ))
        }
    };
    debug!("evaluating {:?}", expression);
    let result = evaluator.evaluate_expression(expression)?;
    debug!("result {:?}", result);
    Ok(json!({ "expression": result }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(value: Value) -> Response {
        handle_value(value, &Evaluator::new())
    }

    fn error_code(response: &Response) -> Option<i64> {
        match &response.outcome {
            Outcome::Error(err) => Some(err.code),
            Outcome::Result(_) => None,
        }
    }

    #[test]
    fn evaluate_success() {
        let response = call(json!({
            "id": 7,
            "method": "evaluate",
            "params": {"expression": "( x y )"},
        }));
        assert_eq!(
            Response::success(json!(7), json!({"expression": "(x y)"})),
            response
        );
    }

    #[test]
    fn evaluate_singletons() {
        let response = call(json!({
            "id": "abc",
            "method": "evaluate",
            "params": {"expression": "( ( x ) )"},
        }));
        assert_eq!(
            Response::success(json!("abc"), json!({"expression": "x"})),
            response
        );
    }

    #[test]
    fn success_wire_shape() {
        let response = Response::success(json!(1), json!({"expression": "(x y)"}));
        assert_eq!(
            r#"{"id":1,"result":{"expression":"(x y)"}}"#,
            serde_json::to_string(&response).unwrap()
        );
    }

    #[test]
    fn error_wire_shape() {
        let response = Response::error(json!(2), ErrorObject::new(INVALID_PARAMS, "nope"));
        assert_eq!(
            r#"{"id":2,"error":{"code":-32602,"message":"nope"}}"#,
            serde_json::to_string(&response).unwrap()
        );
    }

    #[test]
    fn response_decodes_back() {
        let text = r#"{"id":null,"result":null}"#;
        let response: Response = serde_json::from_str(text).unwrap();
        assert_eq!(Response::success(Value::Null, Value::Null), response);
    }

    #[test]
    fn pass_through() {
        let response = call(json!({"id": 1, "method": "ping", "params": {"a": 1}}));
        assert_eq!(Response::success(json!(1), json!({"a": 1})), response);
    }

    #[test]
    fn pass_through_missing_fields() {
        // no method means no evaluate, so params (null) are echoed
        let response = call(json!({"id": 3}));
        assert_eq!(Response::success(json!(3), Value::Null), response);
    }

    #[test]
    fn params_not_object() {
        for params in [json!("( x y )"), json!(["( x y )"]), json!(null), json!(4)] {
            let response = call(json!({"id": 1, "method": "evaluate", "params": params}));
            assert_eq!(json!(1), response.id);
            assert_eq!(Some(INVALID_PARAMS), error_code(&response));
        }
    }

    #[test]
    fn expression_missing_or_wrong_type() {
        for params in [json!({}), json!({"expression": 1}), json!({"expr": "x"})] {
            let response = call(json!({"id": 1, "method": "evaluate", "params": params}));
            assert_eq!(Some(INVALID_PARAMS), error_code(&response));
        }
    }

    #[test]
    fn expression_parse_error() {
        for expression in ["( x", "", ")"] {
            let response = call(json!({
                "id": 1,
                "method": "evaluate",
                "params": {"expression": expression},
            }));
            assert_eq!(Some(EXPRESSION_ERROR), error_code(&response));
        }
    }

    #[test]
    fn evaluation_error() {
        let evaluator = Evaluator::new().with_head_spine_reduction(false);
        let response = handle_value(
            json!({
                "id": 1,
                "method": "evaluate",
                "params": {"expression": "( ( a b ) c )"},
            }),
            &evaluator,
        );
        assert_eq!(Some(EVALUATION_ERROR), error_code(&response));
    }

    #[test]
    fn not_a_request() {
        let response = call(json!([1, "ping", {}]));
        assert_eq!(Value::Null, response.id);
        assert_eq!(Some(INVALID_REQUEST), error_code(&response));

        let response = call(json!({"id": 5, "method": 12}));
        assert_eq!(json!(5), response.id);
        assert_eq!(Some(INVALID_REQUEST), error_code(&response));
    }
}
