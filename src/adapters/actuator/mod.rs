pub mod pump_client;
