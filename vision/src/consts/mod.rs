include!(concat!(env!("OUT_DIR"), "/consts.rs"));

pub const TEMPLATE_PREFIXES: [&str; 4] = ["mm_tp", "mm_sp", "mm_boss", "mm_sub"];
pub const MAX_TEMPLATES_PER_PREFIX: u32 = 99;
