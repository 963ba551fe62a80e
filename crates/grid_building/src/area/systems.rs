//! ECS driving of area volumes.

use bevy::prelude::*;

use super::volume::{AreaDelta, AreaNotice, AreaSnapshot, AreaVolume, VolumePhase};
use crate::grid::GridSystems;
use crate::sets::GridBuildingSet;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// First cell set of a volume, sent once per activation.
#[derive(Event, Debug, Clone)]
pub struct AreaVolumeInitialized {
    pub volume: Entity,
    pub snapshot: AreaSnapshot,
}

/// Every recomputation after initialization.
#[derive(Event, Debug, Clone)]
pub struct AreaVolumeUpdated {
    pub volume: Entity,
    pub snapshot: AreaSnapshot,
    pub delta: AreaDelta,
}

fn send_notice(
    volume: Entity,
    notice: AreaNotice,
    initialized: &mut EventWriter<AreaVolumeInitialized>,
    updated: &mut EventWriter<AreaVolumeUpdated>,
) {
    match notice {
        AreaNotice::Initialized(snapshot) => {
            debug!(
                "area volume {volume} initialized with {} cells",
                snapshot.cells.len()
            );
            initialized.send(AreaVolumeInitialized { volume, snapshot });
        }
        AreaNotice::Updated { snapshot, delta } => {
            updated.send(AreaVolumeUpdated {
                volume,
                snapshot,
                delta,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Recompute active volumes whose trigger fired.
pub fn refresh_area_volumes(
    grids: Option<Res<GridSystems>>,
    mut volumes: Query<(Entity, &Transform, &mut AreaVolume)>,
    mut initialized: EventWriter<AreaVolumeInitialized>,
    mut updated: EventWriter<AreaVolumeUpdated>,
) {
    let Some(grids) = grids else { return };
    for (entity, transform, mut volume) in &mut volumes {
        if volume.phase() != VolumePhase::Active {
            continue;
        }
        if let Some(notice) = volume.refresh(transform.translation, &*grids) {
            send_notice(entity, notice, &mut initialized, &mut updated);
        }
    }
}

/// Activate volumes bound on a previous update.
pub fn activate_area_volumes(
    grids: Option<Res<GridSystems>>,
    mut volumes: Query<(Entity, &Transform, &mut AreaVolume)>,
    mut initialized: EventWriter<AreaVolumeInitialized>,
    mut updated: EventWriter<AreaVolumeUpdated>,
) {
    let Some(grids) = grids else { return };
    for (entity, transform, mut volume) in &mut volumes {
        if volume.phase() != VolumePhase::Bound {
            continue;
        }
        if let Some(notice) = volume.activate(transform.translation, &*grids) {
            send_notice(entity, notice, &mut initialized, &mut updated);
        }
    }
}

/// Bind freshly spawned volumes.
pub fn bind_area_volumes(mut volumes: Query<&mut AreaVolume, Added<AreaVolume>>) {
    for mut volume in &mut volumes {
        volume.bind();
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct AreaPlugin;

impl Plugin for AreaPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AreaVolumeInitialized>()
            .add_event::<AreaVolumeUpdated>()
            .add_systems(
                Update,
                (refresh_area_volumes, activate_area_volumes, bind_area_volumes)
                    .chain()
                    .in_set(GridBuildingSet::Areas),
            );
    }
}
