#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub duration_ms: u128,
    pub body: String,
}
