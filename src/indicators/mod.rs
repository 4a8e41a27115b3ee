pub mod history;
pub mod momentum;
pub mod volatility;

pub use history::{PriceHistory, PriceHistoryBuffer, PriceSample, RecordStatus};
pub use momentum::{ErmReason, ErmResult, ReversalMomentumDetector};
pub use volatility::RollingAtr;
