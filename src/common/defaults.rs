/// Number of worker threads used to fan out concurrent iteration callbacks.
pub const DEFAULT_ITER_WORKERS: usize = 30;

/// Size in bytes of a key generated by `append`.
pub const SEQ_KEY_SIZE: usize = 8;

pub const ITER_THREAD_PREFIX: &str = "blight-iter";
