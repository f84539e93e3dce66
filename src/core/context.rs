/// Who is acting, on which trip. Built per request by the transport layer
/// and passed into every ledger operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub trip_id: String,
    pub acting_user: String,
}

impl RequestContext {
    pub fn new(trip_id: impl Into<String>, acting_user: impl Into<String>) -> Self {
        RequestContext {
            trip_id: trip_id.into(),
            acting_user: acting_user.into(),
        }
    }
}
