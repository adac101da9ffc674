pub mod cross_exchange;
pub mod intra_cross_exchange;
pub mod intra_exchange;
pub mod intra_mixed_exchange;
pub mod intra_or_opt;
pub mod intra_relocate;
pub mod intra_two_opt;
pub mod local_search;
pub mod mixed_exchange;
pub mod operator;
pub mod or_opt;
pub mod pd_shift;
pub mod priority_replace;
pub mod relocate;
pub mod reverse_two_opt;
pub mod route_exchange;
pub mod route_split;
pub mod swap_star;
pub mod tsp_fix;
pub mod two_opt;
pub mod unassigned_exchange;
