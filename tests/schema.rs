use anyhow::Result;
use digimall_reviews::review::Review;
use schemars::generate::SchemaSettings;

#[test]
fn test_review_schema_uses_wire_field_names() -> Result<()> {
    let generator = SchemaSettings::draft2020_12()
        .for_serialize()
        .into_generator();
    let schema = generator.into_root_schema_for::<Review>();
    let value = serde_json::to_value(&schema)?;

    let properties = value["properties"]
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("schema should have properties"))?;
    for field in [
        "id",
        "type",
        "target",
        "author",
        "rating",
        "status",
        "isFlagged",
        "isVerifiedPurchase",
        "helpfulCount",
        "createdAt",
        "updatedAt",
    ] {
        assert!(properties.contains_key(field), "missing {}", field);
    }
    assert!(!properties.contains_key("review_type"));

    let required = value["required"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("schema should list required fields"))?;
    assert!(required.iter().any(|f| f == "content"));
    assert!(!required.iter().any(|f| f == "title"));
    Ok(())
}
