mod mocks;

use mocks::{CountingCloud, LOCAL, compute_order, controller_with, user_of, volume_order};

use federation_broker::domain::federation_model::order::allocation::{Allocation, ComputeAllocation, VolumeAllocation};
use federation_broker::domain::federation_model::order::instance::InstanceState;
use federation_broker::domain::federation_model::order::order::OrderRef;
use federation_broker::domain::federation_model::order::order_state::OrderState;
use federation_broker::domain::federation_model::order::resource_type::ResourceType;
use federation_broker::domain::federation_model::order_controller::order_controller::OrderController;
use federation_broker::domain::federation_model::processors::open_processor::OpenProcessor;
use federation_broker::domain::federation_model::processors::order_processor::OrderProcessor;
use federation_broker::domain::federation_model::utils::id::{InstanceId, MemberId, OrderId};
use federation_broker::error::Error;

fn state_of(order: &OrderRef) -> Option<OrderState> {
    order.read().unwrap().state()
}

/// Walks an active order along `path` through the transitioner.
fn drive(controller: &OrderController, id: &OrderId, path: &[OrderState]) -> OrderRef {
    let order = controller.get_active(id).unwrap();
    for window in path.windows(2) {
        assert!(controller.transitioner().transition(&order, window[0], window[1]), "{} -> {}", window[0], window[1]);
    }
    order
}

#[test]
fn test_scenario_a_placeholder_until_instance_then_live() {
    let cloud = CountingCloud::new("vm-1");
    let controller = controller_with(cloud.clone(), None);
    let user = user_of(LOCAL);

    let id = controller.activate(compute_order(LOCAL, LOCAL, 2, 4096)).unwrap();
    let order = controller.get_active(&id).unwrap();
    assert!(controller.registry().queue(OrderState::Open).unwrap().contains(&order));
    assert_eq!(controller.get_order(&id, &user).unwrap().id, id);

    let placeholder = controller.get_resource_instance(&id).unwrap();
    assert_eq!(placeholder.state, InstanceState::Dispatched);
    assert!(placeholder.details.is_none());
    assert_eq!(cloud.total_calls(), 0);

    OpenProcessor::new(controller.clone()).process_order(&order).unwrap();
    assert_eq!(cloud.calls("compute.request"), 1);
    assert_eq!(order.read().unwrap().instance_id, Some(InstanceId::new("vm-1")));
    assert_eq!(state_of(&order), Some(OrderState::Spawning));

    let live = controller.get_resource_instance(&id).unwrap();
    assert_eq!(cloud.calls("compute.get"), 1);
    assert_eq!(live.id, InstanceId::new("vm-1"));
    assert_eq!(live.state, InstanceState::Ready);
    assert_eq!(live.provider, Some(MemberId::new(LOCAL)));
    assert_eq!(order.read().unwrap().cached_instance_state, Some(InstanceState::Ready));
}

#[test]
fn test_scenario_b_failed_order_without_instance_makes_no_calls() {
    let cloud = CountingCloud::new("vm-1");
    let controller = controller_with(cloud.clone(), None);

    let id = controller.activate(compute_order(LOCAL, LOCAL, 1, 1024)).unwrap();
    drive(&controller, &id, &[OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::FailedAfterSuccessfulRequest]);

    let instance = controller.get_resource_instance(&id).unwrap();

    assert_eq!(instance.state, InstanceState::Failed);
    assert_eq!(cloud.total_calls(), 0);
}

#[test]
fn test_scenario_c_delete_spawning_order() {
    let cloud = CountingCloud::new("vm-1");
    let controller = controller_with(cloud.clone(), None);

    let id = controller.activate(compute_order(LOCAL, LOCAL, 1, 1024)).unwrap();
    let order = drive(&controller, &id, &[OrderState::Open, OrderState::Pending, OrderState::Spawning]);
    order.write().unwrap().instance_id = Some(InstanceId::new("vm-1"));

    controller.delete_order(&id).unwrap();

    assert_eq!(cloud.calls("compute.delete"), 1);
    assert_eq!(state_of(&order), Some(OrderState::Closed));
    assert!(order.read().unwrap().instance_id.is_none());
    assert!(!controller.registry().queue(OrderState::Spawning).unwrap().contains(&order));
    assert!(controller.registry().queue(OrderState::Closed).unwrap().contains(&order));
    assert!(controller.registry().is_consistent());
}

#[test]
fn test_delete_is_idempotent() {
    let cloud = CountingCloud::new("vm-1");
    let controller = controller_with(cloud.clone(), None);
    let id = controller.activate(volume_order(LOCAL, LOCAL, 10)).unwrap();
    let order = controller.get_active(&id).unwrap();

    controller.delete_order(&id).unwrap();
    let second = controller.delete_order(&id);

    assert!(matches!(second, Err(Error::InstanceNotFound(_))));
    assert_eq!(state_of(&order), Some(OrderState::Closed));
    assert!(controller.registry().queue(OrderState::Closed).unwrap().contains(&order));
    assert_eq!(cloud.total_calls(), 0);
}

#[test]
fn test_delete_rejects_empty_and_unknown_ids() {
    let controller = controller_with(CountingCloud::new("vm-1"), None);

    assert!(matches!(controller.delete_order(&OrderId::new("")), Err(Error::InvalidParameter(_))));
    assert!(matches!(controller.delete_order(&OrderId::new("missing")), Err(Error::InstanceNotFound(_))));
}

#[test]
fn test_every_live_state_can_be_deleted() {
    let controller = controller_with(CountingCloud::new("vm-1"), None);
    let paths: [&[OrderState]; 5] = [
        &[OrderState::Open],
        &[OrderState::Open, OrderState::Pending],
        &[OrderState::Open, OrderState::FailedOnRequest],
        &[OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::Fulfilled],
        &[OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::Fulfilled, OrderState::FailedAfterSuccessfulRequest],
    ];

    for path in paths {
        let id = controller.activate(volume_order(LOCAL, LOCAL, 1)).unwrap();
        let order = drive(&controller, &id, path);
        controller.delete_order(&id).unwrap();
        assert_eq!(state_of(&order), Some(OrderState::Closed), "from {:?}", path.last());
    }
    assert!(controller.registry().is_consistent());
}

#[test]
fn test_scenario_e_allocation_sums_fulfilled_orders() {
    let controller = controller_with(CountingCloud::new("vm-1"), None);
    let user = user_of(LOCAL);
    let fulfilled = [OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::Fulfilled];

    let first = controller.activate(compute_order(LOCAL, LOCAL, 2, 4096)).unwrap();
    let second = controller.activate(compute_order(LOCAL, LOCAL, 1, 2048)).unwrap();
    drive(&controller, &first, &fulfilled);
    drive(&controller, &second, &fulfilled);

    // Not counted: still spawning, another user, another type.
    let spawning = controller.activate(compute_order(LOCAL, LOCAL, 4, 8192)).unwrap();
    drive(&controller, &spawning, &fulfilled[..3]);
    let mut foreign = compute_order(LOCAL, LOCAL, 4, 8192);
    foreign.federation_user.user_id = "bob".to_string();
    let foreign = controller.activate(foreign).unwrap();
    drive(&controller, &foreign, &fulfilled);
    let volume = controller.activate(volume_order(LOCAL, LOCAL, 50)).unwrap();
    drive(&controller, &volume, &fulfilled);

    let compute = controller.get_user_allocation(&MemberId::new(LOCAL), &user, ResourceType::Compute).unwrap();
    let storage = controller.get_user_allocation(&MemberId::new(LOCAL), &user, ResourceType::Volume).unwrap();
    let elsewhere = controller.get_user_allocation(&MemberId::new("m9"), &user, ResourceType::Compute).unwrap();

    assert_eq!(compute, Allocation::Compute(ComputeAllocation::new(3, 6144, 2)));
    assert_eq!(storage, Allocation::Volume(VolumeAllocation::new(50, 1)));
    assert_eq!(elsewhere, Allocation::Compute(ComputeAllocation::new(0, 0, 0)));
}

#[test]
fn test_instances_status_reads_cached_state_only() {
    let cloud = CountingCloud::new("vm-1");
    let controller = controller_with(cloud.clone(), None);
    let user = user_of(LOCAL);

    let fulfilled = controller.activate(compute_order(LOCAL, LOCAL, 1, 1024)).unwrap();
    let order = drive(&controller, &fulfilled, &[OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::Fulfilled]);
    order.write().unwrap().cached_instance_state = Some(InstanceState::Ready);
    let failed = controller.activate(compute_order(LOCAL, LOCAL, 1, 1024)).unwrap();
    drive(&controller, &failed, &[OrderState::Open, OrderState::Pending, OrderState::Spawning, OrderState::FailedAfterSuccessfulRequest]);
    controller.activate(compute_order(LOCAL, LOCAL, 1, 1024)).unwrap();

    let statuses = controller.get_instances_status(&user, ResourceType::Compute);

    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().any(|status| status.order_id == fulfilled && status.state == Some(InstanceState::Ready)));
    assert!(statuses.iter().any(|status| status.order_id == failed && status.state.is_none()));
    assert!(controller.get_instances_status(&user, ResourceType::Volume).is_empty());
    assert_eq!(cloud.total_calls(), 0);
}

#[test]
fn test_activate_rejects_duplicate_id() {
    let controller = controller_with(CountingCloud::new("vm-1"), None);
    let order = compute_order(LOCAL, LOCAL, 1, 1024);
    let duplicate = order.clone();

    controller.activate(order).unwrap();

    assert!(matches!(controller.activate(duplicate), Err(Error::InvalidParameter(_))));
    assert_eq!(controller.registry().active_count(), 1);
}
