mod human;

pub(crate) use human::{HumanOutput, print_case, print_tally};
