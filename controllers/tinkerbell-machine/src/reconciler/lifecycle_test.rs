//! Unit tests for the end-to-end machine lifecycle

#[cfg(test)]
mod tests {
    use crds::WorkflowState;
    use store_client::{ResourceStore, StoreOp};

    use crate::error::ControllerError;
    use crate::reconciler::ReconcileOutcome;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_missing_machine_is_gone() {
        let world = TestWorld::new();

        let outcome = world.reconcile("n1").await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Gone);
        assert_eq!(world.journal.count("TinkerbellMachine", StoreOp::Get), 1);
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_provision_then_delete() {
        let world = TestWorld::new();
        world.seed_ready();

        assert_eq!(world.reconcile("n1").await.unwrap(), ReconcileOutcome::Progressing);
        world
            .workflows
            .insert(workflow("n1", "h1", Some(WorkflowState::Success)));
        assert_eq!(world.reconcile("n1").await.unwrap(), ReconcileOutcome::Complete);

        // Deletion with the finalizer present only records intent.
        world.machines.delete(&key("n1")).await.unwrap();
        assert!(world.machines.peek(&key("n1")).unwrap().deletion_requested());
        world.journal.clear();

        assert_eq!(world.reconcile("n1").await.unwrap(), ReconcileOutcome::Complete);
        assert_eq!(
            world.journal.write_log(),
            vec![
                "Delete Template default/n1",
                "Delete Workflow default/n1",
                "Update Hardware h1",
                "Update BMC p1",
                "Update TinkerbellMachine default/n1",
            ]
        );
        assert!(!world.machines.contains(&key("n1")));
        assert_eq!(world.hardware.peek(&cluster_key("h1")).unwrap().owner(), None);

        assert_eq!(world.reconcile("n1").await.unwrap(), ReconcileOutcome::Gone);
    }

    #[tokio::test]
    async fn test_released_hardware_can_be_claimed_again() {
        let world = TestWorld::new();
        world.seed_deleting();
        world.reconcile("n1").await.unwrap();

        world.machines.insert(tinkerbell_machine("n3", "h1", Some("m1")));
        assert_eq!(world.reconcile("n3").await.unwrap(), ReconcileOutcome::Progressing);
        assert_eq!(
            world.hardware.peek(&cluster_key("h1")).unwrap().owner().unwrap().name,
            "n3"
        );
    }

    #[tokio::test]
    async fn test_deleting_machine_is_not_provisioned() {
        let world = TestWorld::new();
        world.seed_deleting();

        world.reconcile("n1").await.unwrap();
        assert_eq!(world.journal.count("Template", StoreOp::Create), 0);
        assert_eq!(world.journal.count("Workflow", StoreOp::Create), 0);
        assert_eq!(world.journal.count("Machine", StoreOp::Get), 0);
    }

    #[tokio::test]
    async fn test_versionless_machine_writes_nothing() {
        let world = TestWorld::new();
        world.seed_upstream();
        world
            .capi_machines
            .insert(capi_machine("m2", Some("b1"), Some(""), Some("c1")));
        world.machines.insert(tinkerbell_machine("n2", "h1", Some("m2")));
        world.hardware.insert(hardware("h1", "p1"));

        let err = world.reconcile("n2").await.unwrap_err();
        assert!(matches!(err, ControllerError::MachineVersionEmpty));
        assert!(world.journal.writes().is_empty());
        assert!(!world.machines.peek(&key("n2")).unwrap().has_machine_finalizer());
        assert_eq!(world.hardware.peek(&cluster_key("h1")).unwrap().owner(), None);
    }
}
