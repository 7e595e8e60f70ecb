#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Integer,
    BigInt,
    SmallInt,
    Text,
    VarChar(u32),
    Boolean,
    Timestamp,
    TimestampTz,
    Date,
    Uuid,
    Json,
    JsonB,
    Real,
    DoublePrecision,
    Decimal { precision: u32, scale: u32 },
}
