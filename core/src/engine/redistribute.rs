use crate::engine::lock::LockSet;
use crate::model::{Allocation, Channel};
use crate::prelude::{PlanError, PlanResult};
use crate::telemetry::log::LogManager;

/// Splits whatever the locked channels leave of `total_budget` evenly over the
/// unlocked channels, clamping each share to the channel's bounds.
///
/// Single pass: surplus or deficit created by clamping stays unplaced. Locked
/// channels and entries outside the catalog keep their current spend.
pub fn redistribute(
    channels: &[Channel],
    current: &Allocation,
    locked: &LockSet,
    total_budget: f64,
) -> PlanResult<Allocation> {
    let logger = LogManager::new("redistribute");
    let locked_budget: f64 = locked.iter().map(|id| current.spend_of(id)).sum();
    let remainder = total_budget - locked_budget;

    let unlocked: Vec<&Channel> = channels
        .iter()
        .filter(|channel| !locked.is_locked(&channel.id))
        .collect();

    if unlocked.is_empty() {
        if remainder != 0.0 {
            logger.notice(&format!("{:.2} left with every channel locked", remainder));
            return Err(PlanError::EmptyChannelSet { remainder });
        }
        return Ok(current.clone());
    }

    let share = remainder / unlocked.len() as f64;
    let mut allocation = current.clone();
    for channel in unlocked {
        allocation.set(channel.id.clone(), channel.clamp(share))?;
    }

    logger.record(&format!(
        "split {:.2} as {:.2} per unlocked channel, allocated {:.2}",
        remainder,
        share,
        allocation.total()
    ));
    Ok(allocation)
}
