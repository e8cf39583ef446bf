// Chrome Collect state managers
// Managers own persisted records: the bookmark table.

pub mod bookmark_store;
