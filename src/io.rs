pub mod report_client;
