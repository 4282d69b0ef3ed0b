use rand::Rng;

/// Returns a new identifier of the form `<prefix>_<8 lowercase hex digits>`.
pub fn new_id(prefix: &str) -> String {
    let suffix: u32 = rand::rng().random();
    format!("{}_{:08x}", prefix, suffix)
}
