use serde::{Deserialize, Serialize};

/// An action request addressed to a workcell.
///
/// Identity is `request_guid`; two deliveries with the same guid refer to the
/// same request. Any fields beyond the addressing pair (item lists,
/// transporter hints, ...) are carried opaquely in `payload`; the
/// coordinator never inspects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkcellRequest {
  /// Unique identity of this request.
  pub request_guid: String,
  /// Guid of the workcell this request is addressed to.
  pub target_guid: String,
  /// Remaining wire fields, kept opaque.
  #[serde(flatten)]
  pub payload: serde_json::Map<String, serde_json::Value>,
}
