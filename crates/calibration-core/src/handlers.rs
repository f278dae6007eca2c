//! One handler per command.
//!
//! Handlers mutate only the [`SessionData`] working copy they are given and
//! touch it only after their hardware call succeeds. The controller decides
//! whether the copy is committed.

use chrono::Utc;
use tracing::{debug, warn};

use crate::command::CommandName;
use crate::error::{CalibrationError, LabwareError};
use crate::ports::{CalibrationStore, HardwarePort, LabwarePort, TipLengthRecord};
use crate::session::{SessionData, SessionState};
use crate::settings::{CalibrationSettings, TipVerification};
use crate::types::{Mount, Point, TipRackGeometry};

pub(crate) struct HandlerContext<'a, H, L, S> {
    pub hardware: &'a H,
    pub labware: &'a L,
    pub store: &'a S,
    pub settings: &'a CalibrationSettings,
    pub mount: Mount,
    pub tip_rack: &'a str,
    pub state: SessionState,
}

impl<H, L, S> HandlerContext<'_, H, L, S> {
    fn geometry<'d>(&self, data: &'d SessionData) -> Result<&'d TipRackGeometry, CalibrationError> {
        data.tip_rack
            .as_ref()
            .ok_or_else(|| LabwareError::NotFound(self.tip_rack.to_string()).into())
    }

    fn tip_reference_pose(&self, geometry: &TipRackGeometry) -> Point {
        self.settings.nozzle_reference_pose + Point::new(0.0, 0.0, geometry.tip_length)
    }
}

pub(crate) async fn load_labware<H, L: LabwarePort, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    let geometry = ctx.labware.load_tip_rack(ctx.tip_rack).await?;
    if !geometry.tip_length.is_finite() || geometry.tip_length <= 0.0 {
        return Err(LabwareError::Invalid {
            load_name: geometry.load_name,
            reason: format!("tip length {} is not a positive length", geometry.tip_length),
        }
        .into());
    }
    debug!(tip_rack = %geometry.load_name, tip_length = geometry.tip_length, "tip rack loaded");
    data.tip_rack = Some(geometry);
    Ok(())
}

pub(crate) async fn move_to_measure_nozzle_offset<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    let pose = ctx.settings.nozzle_reference_pose;
    ctx.hardware
        .move_absolute(ctx.mount, pose)
        .await
        .map_err(CalibrationError::HardwareMove)?;
    data.position.reset(pose);
    Ok(())
}

pub(crate) async fn jog<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
    vector: Point,
) -> Result<(), CalibrationError> {
    // A refused jog must not reach the hardware.
    let accumulated = ctx.state.is_measuring().then(|| {
        let mut position = data.position.clone();
        position.accumulate(vector);
        position
    });
    if let Some(offset) = accumulated.as_ref().and_then(|p| p.offset()) {
        if !offset.is_finite() {
            return Err(CalibrationError::InvalidPayload {
                command: CommandName::Jog,
                reason: format!("jog would move the position estimate out of range ({})", offset),
            });
        }
    }

    ctx.hardware
        .move_relative(ctx.mount, vector)
        .await
        .map_err(CalibrationError::HardwareMove)?;
    if let Some(position) = accumulated {
        data.position = position;
    }
    Ok(())
}

pub(crate) fn save_nozzle_position<H, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    let offset = data
        .position
        .offset()
        .ok_or(CalibrationError::IncompleteMeasurement(ctx.state))?;
    data.measurements.nozzle_offset = Some(offset);
    Ok(())
}

pub(crate) async fn pick_up_tip<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    let tip_length = ctx.geometry(data)?.tip_length;
    ctx.hardware
        .pick_up_tip(ctx.mount, tip_length)
        .await
        .map_err(CalibrationError::TipPickup)?;
    data.tip_picked_up = true;
    Ok(())
}

pub(crate) async fn invalidate_tip<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    ctx.hardware
        .drop_tip(ctx.mount)
        .await
        .map_err(CalibrationError::TipPickup)?;
    data.tip_picked_up = false;
    data.measurements.invalidate_tip();
    Ok(())
}

pub(crate) async fn confirm_tip_attached<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    match ctx.settings.tip_verification {
        TipVerification::TrustPickUp => {
            if !data.tip_picked_up {
                return Err(CalibrationError::TipNotAttached(
                    "no successful pick_up_tip since the last invalidate".into(),
                ));
            }
        }
        TipVerification::QueryHardware => {
            let info = ctx
                .hardware
                .query_attached_instrument(ctx.mount)
                .await
                .map_err(CalibrationError::TipCheck)?;
            match info {
                Some(info) if info.has_tip => data.pipette_id = info.pipette_id,
                Some(info) => {
                    return Err(CalibrationError::TipNotAttached(format!(
                        "{} on {} mount reports no tip",
                        info.model, ctx.mount
                    )))
                }
                None => {
                    return Err(CalibrationError::TipNotAttached(format!(
                        "no instrument on {} mount",
                        ctx.mount
                    )))
                }
            }
        }
    }

    let pose = ctx.tip_reference_pose(ctx.geometry(data)?);
    ctx.hardware
        .move_absolute(ctx.mount, pose)
        .await
        .map_err(CalibrationError::HardwareMove)?;
    data.measurements.tip_attached = true;
    data.position.reset(pose);
    Ok(())
}

pub(crate) async fn save_tip_position<H, L, S: CalibrationStore>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Result<(), CalibrationError> {
    let tip_offset = data
        .position
        .offset()
        .ok_or(CalibrationError::IncompleteMeasurement(ctx.state))?;
    // The table only reaches this state through save_nozzle_position.
    let nozzle_offset = data
        .measurements
        .nozzle_offset
        .ok_or(CalibrationError::IncompleteMeasurement(SessionState::MeasuringNozzleOffset))?;
    let nominal = ctx.geometry(data)?.tip_length;
    let tip_length = SessionData::derive_tip_length(nominal, nozzle_offset, tip_offset);

    let record = TipLengthRecord {
        mount: ctx.mount,
        tip_rack: ctx.tip_rack.to_string(),
        pipette_id: data.pipette_id.clone(),
        nozzle_offset,
        tip_offset,
        tip_length,
        recorded_at: Utc::now(),
    };
    ctx.store
        .save_tip_length(&record)
        .await
        .map_err(CalibrationError::Persistence)?;

    data.measurements.tip_offset = Some(tip_offset);
    data.measurements.tip_length = Some(tip_length);
    Ok(())
}

/// Best-effort release. Never fails; problems come back as warnings.
pub(crate) async fn exit_session<H: HardwarePort, L, S>(
    ctx: &HandlerContext<'_, H, L, S>,
    data: &mut SessionData,
) -> Vec<String> {
    let mut warnings = Vec::new();

    if data.measurements.tip_attached || data.tip_picked_up {
        if let Err(e) = ctx.hardware.drop_tip(ctx.mount).await {
            warn!(mount = %ctx.mount, error = %e, "drop tip failed during exit");
            warnings.push(format!("drop tip: {}", e));
        } else {
            // Measurements stay as recorded; only the physical-tip flag clears.
            data.tip_picked_up = false;
        }
    }

    if let Err(e) = ctx.hardware.home(ctx.mount).await {
        warn!(mount = %ctx.mount, error = %e, "home failed during exit");
        warnings.push(format!("home: {}", e));
    }

    // Unsaved jogs are discarded.
    data.position = Default::default();
    warnings
}
