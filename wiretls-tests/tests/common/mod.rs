//! Shared helpers for integration tests

use wiretls_record::record::RECORD_HEADER_SIZE;

/// Parse (content_type, payload) pairs out of a null-sealed wire stream
pub fn parse_records(mut bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut records = Vec::new();
    while !bytes.is_empty() {
        assert!(
            bytes.len() >= RECORD_HEADER_SIZE,
            "truncated record header"
        );
        let length = usize::from(bytes[3]) << 8 | usize::from(bytes[4]);
        let end = RECORD_HEADER_SIZE + length;
        assert!(bytes.len() >= end, "truncated record payload");
        records.push((bytes[0], bytes[RECORD_HEADER_SIZE..end].to_vec()));
        bytes = &bytes[end..];
    }
    records
}

/// Concatenate the payloads of all application-data records
pub fn reassemble(bytes: &[u8]) -> Vec<u8> {
    parse_records(bytes)
        .into_iter()
        .filter(|(ty, _)| *ty == 23)
        .flat_map(|(_, payload)| payload)
        .collect()
}
