use crate::db_types::Order;

#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    Inserted(Order),
    /// An order with this number was already on record. The existing order is returned unchanged.
    AlreadyExists(Order),
}

#[derive(Debug, Clone)]
pub enum ApplyVerdictResult {
    Applied(Order),
    /// Either there is no order with this number, or it has already reached a terminal status.
    NotFound,
}
