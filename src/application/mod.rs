pub mod use_cases;

pub use use_cases::accounts::AccountUseCase;
pub use use_cases::compliance_lists::ComplianceLists;
pub use use_cases::scrub_engine::ScrubEngine;
pub use use_cases::scrub_file::ScrubFileUseCase;
pub use use_cases::scrub_options::ScrubOptionsUseCase;
pub use use_cases::suppression_list::SuppressionListUseCase;
