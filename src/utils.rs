use serde_json::Value;
use tide::{Response, Result, StatusCode};


pub(crate) struct RespUtil;

impl RespUtil {

  pub fn ok(data: Value) -> Result<Response> {
    let mut resp = Response::new(StatusCode::Ok);
    resp.set_body(data);
    Ok(resp)
  }

}
