pub mod order_sync;
