use super::*;

#[test]
fn index_record_structure() {
    let metadata = ChunkMetadata {
        source: "docs/enrolment.txt".to_string(),
        chunk_index: 2,
        content: "Enrol in COSC1111 by March 1.".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };

    let record = IndexRecord {
        id: "record_123".to_string(),
        vector: vec![0.1, 0.2, 0.3],
        metadata,
    };

    assert_eq!(record.id, "record_123");
    assert_eq!(record.vector.len(), 3);
    assert_eq!(record.metadata.source, "docs/enrolment.txt");
    assert_eq!(record.metadata.chunk_index, 2);
}

#[test]
fn chunk_metadata_serialization() {
    let metadata = ChunkMetadata {
        source: "docs/fees.txt".to_string(),
        chunk_index: 0,
        content: "Fees are due at census.".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };

    let json = serde_json::to_string(&metadata).expect("can serialize json");
    let deserialized: ChunkMetadata = serde_json::from_str(&json).expect("can parse json");

    assert_eq!(metadata, deserialized);
}
