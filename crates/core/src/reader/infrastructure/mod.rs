pub mod channel_cancellation;
