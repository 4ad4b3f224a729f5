use crate::replication::{Notification, PointStateNotice};
use crate::types::{ActorId, InteractionKind, InteractionResult, PointId, VisibilityPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Local,
    ToOwner,
    LocalAndBroadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutTarget {
    pub point: PointId,
    pub actor: ActorId,
    pub kind: InteractionKind,
    pub visibility: VisibilityPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutRequest {
    pub interactor: ActorId,
    pub result: InteractionResult,
    pub interactor_visibility: VisibilityPolicy,
    pub owner_is_local: bool,
    pub target: Option<FanoutTarget>,
}

/// Owner-only pairs share one unicast.
pub fn plan_fanout(request: FanoutRequest) -> Vec<(Delivery, Notification)> {
    let mut plan = Vec::with_capacity(2);
    let point_notice = request.target.map(|target| PointStateNotice {
        point: target.point,
        result: request.result,
        interactor: request.interactor,
    });
    let point_visibility = request
        .target
        .map(|target| target.visibility)
        .unwrap_or(VisibilityPolicy::None);
    let piggyback = request.interactor_visibility == VisibilityPolicy::OwnerOnly
        && point_visibility == VisibilityPolicy::OwnerOnly;

    let owner_delivery = if request.owner_is_local {
        Delivery::Local
    } else {
        Delivery::ToOwner
    };

    let interactor_delivery = match request.interactor_visibility {
        VisibilityPolicy::None => None,
        VisibilityPolicy::OwnerOnly => Some(owner_delivery),
        VisibilityPolicy::All => Some(Delivery::LocalAndBroadcast),
    };
    if let Some(delivery) = interactor_delivery {
        plan.push((
            delivery,
            Notification::InteractorState {
                result: request.result,
                kind: request
                    .target
                    .map(|target| target.kind)
                    .unwrap_or(InteractionKind::None),
                target_actor: request.target.map(|target| target.actor),
                point_state: if piggyback { point_notice } else { None },
            },
        ));
    }

    if piggyback {
        return plan;
    }
    let Some(notice) = point_notice else {
        return plan;
    };
    let point_delivery = match point_visibility {
        VisibilityPolicy::None => None,
        VisibilityPolicy::OwnerOnly => Some(owner_delivery),
        VisibilityPolicy::All => Some(Delivery::LocalAndBroadcast),
    };
    if let Some(delivery) = point_delivery {
        plan.push((delivery, Notification::PointState(notice)));
    }
    plan
}
