//! Canned exchange responses for sandbox operation without network access.
//! Shapes mirror the real wire format so downstream parsing stays identical.

use rand::Rng;

#[derive(Debug, Default)]
pub struct MockExchange;

impl MockExchange {
    /// Pipe response for an order-entry call: success code, confirmation
    /// message, then the exchange order number as the first data segment.
    pub fn order_entry_response(&self, trans_code: &str) -> String {
        let order_number: u64 = rand::thread_rng().gen_range(10_000_000..100_000_000);
        match trans_code {
            "CXL" => format!("100|ORDER CANCELLED SUCCESSFULLY|{order_number}"),
            _ => format!("100|ORDER CONFIRMATION RECEIVED|{order_number}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use domain_types::parse_pipe_response;

    use super::*;

    #[test]
    fn mock_responses_parse_like_real_ones() {
        let result = parse_pipe_response(&MockExchange.order_entry_response("NEW"));
        assert!(result.success);
        assert_eq!(result.data.len(), 1);
        assert!(result.data[0].parse::<u64>().is_ok());
    }
}
