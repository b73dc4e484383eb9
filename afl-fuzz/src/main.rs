fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    afl::fuzz!(|data: &[u8]| {
        let first = photo_meta::decode(data);
        // decoding must be repeatable on any input
        assert_eq!(first, photo_meta::decode(data));
    });
}
