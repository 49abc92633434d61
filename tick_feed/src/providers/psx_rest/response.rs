use serde::Deserialize;

use crate::models::tick::TickQuote;

/// Envelope returned by `GET /api/ticks/{market}/{symbol}`.
#[derive(Deserialize, Debug)]
pub struct PsxTickResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<TickQuote>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PsxTickResponse {
    /// The quote of a successful response, `None` otherwise.
    pub fn into_quote(self) -> Option<TickQuote> {
        if self.success { self.data } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_quote() {
        let body = r#"{"success":true,"data":{"market":"REG","st":"OPN","s":"HBL","c":151.2,"o":150.0,"h":152.0,"l":149.5,"v":12000,"t":1700000000}}"#;
        let resp: PsxTickResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.into_quote(), Some(TickQuote::new(150.0, 152.0, 149.5, 151.2)));
    }

    #[test]
    fn failure_yields_nothing() {
        let body = r#"{"success":false,"message":"Symbol not found"}"#;
        let resp: PsxTickResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.message.as_deref(), Some("Symbol not found"));
        assert_eq!(resp.into_quote(), None);
    }
}
