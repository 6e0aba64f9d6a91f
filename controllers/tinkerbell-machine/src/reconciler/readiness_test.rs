//! Unit tests for the readiness gate

#[cfg(test)]
mod tests {
    use store_client::StoreOp;

    use crate::error::{ControllerError, ErrorClass};
    use crate::reconciler::ReconcileOutcome;
    use crate::reconciler::readiness::{
        BOOTSTRAP_DATA_PENDING, CLUSTER_NOT_READY, OWNER_NOT_SET, bootstrap_data, machine_readiness,
        owner_machine_name,
    };
    use crate::test_utils::*;

    fn not_ready(reason: &str) -> ReconcileOutcome {
        ReconcileOutcome::NotReady {
            reason: reason.to_string(),
        }
    }

    /// Seeds machine `n1` on free Hardware `h1` without any upstream records.
    fn seed_node(world: &TestWorld, owner: Option<&str>) {
        world.machines.insert(tinkerbell_machine("n1", "h1", owner));
        world.hardware.insert(hardware("h1", "p1"));
        world.bmcs.insert(bmc("p1"));
    }

    #[test]
    fn test_owner_machine_name_requires_cluster_api_group() {
        let machine = tinkerbell_machine("n1", "h1", Some("m1"));
        assert_eq!(owner_machine_name(&machine.metadata), Some("m1"));

        let mut foreign = machine.clone();
        if let Some(owners) = foreign.metadata.owner_references.as_mut() {
            owners[0].api_version = "example.com/v1".to_string();
        }
        assert_eq!(owner_machine_name(&foreign.metadata), None);
    }

    #[test]
    fn test_machine_readiness_order() {
        let pending = capi_machine("m1", None, None, Some("c1"));
        assert_eq!(machine_readiness(&pending).unwrap(), Some(BOOTSTRAP_DATA_PENDING));

        let ready = capi_machine("m1", Some("b1"), Some(VERSION), Some("c1"));
        assert_eq!(machine_readiness(&ready).unwrap(), None);

        let versionless = capi_machine("m1", Some("b1"), Some(""), Some("c1"));
        assert!(matches!(
            machine_readiness(&versionless),
            Err(ControllerError::MachineVersionEmpty)
        ));
    }

    #[test]
    fn test_bootstrap_data_decodes_value_key() {
        let secret = bootstrap_secret("b1", Some(BOOTSTRAP_DATA.as_bytes()));
        assert_eq!(bootstrap_data(&secret).unwrap(), BOOTSTRAP_DATA);

        let missing = bootstrap_secret("b1", None);
        assert!(matches!(
            bootstrap_data(&missing),
            Err(ControllerError::MissingBootstrapKey(name)) if name == "b1"
        ));

        let empty = bootstrap_secret("b1", Some(b""));
        assert!(matches!(
            bootstrap_data(&empty),
            Err(ControllerError::EmptyBootstrapData(name)) if name == "b1"
        ));
    }

    #[tokio::test]
    async fn test_waits_for_owner_without_writes() {
        let world = TestWorld::new();
        world.seed_upstream();
        seed_node(&world, None);

        let outcome = world.reconcile("n1").await.unwrap();
        assert_eq!(outcome, not_ready(OWNER_NOT_SET));
        assert!(world.journal.writes().is_empty());
        assert_eq!(world.journal.count("Machine", StoreOp::Get), 0);
        assert!(!world.machines.peek(&key("n1")).unwrap().has_machine_finalizer());
    }

    #[tokio::test]
    async fn test_waits_for_bootstrap_secret_reference() {
        let world = TestWorld::new();
        world.seed_upstream();
        world
            .capi_machines
            .insert(capi_machine("m1", None, Some(VERSION), Some("c1")));
        seed_node(&world, Some("m1"));

        let outcome = world.reconcile("n1").await.unwrap();
        assert_eq!(outcome, not_ready(BOOTSTRAP_DATA_PENDING));
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_tinkerbell_cluster_ready() {
        let world = TestWorld::new();
        world.seed_upstream();
        world.tinkerbell_clusters.insert(tinkerbell_cluster("tc1", false));
        seed_node(&world, Some("m1"));

        let outcome = world.reconcile("n1").await.unwrap();
        assert_eq!(outcome, not_ready(CLUSTER_NOT_READY));
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_cluster_infrastructure_ref() {
        let world = TestWorld::new();
        world.seed_upstream();
        world.capi_clusters.insert(capi_cluster("c1", None));
        seed_node(&world, Some("m1"));

        let outcome = world.reconcile("n1").await.unwrap();
        assert_eq!(outcome, not_ready(CLUSTER_NOT_READY));
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_version_is_configuration_error() {
        let world = TestWorld::new();
        world.seed_upstream();
        world
            .capi_machines
            .insert(capi_machine("m2", Some("b1"), Some(""), Some("c1")));
        world.machines.insert(tinkerbell_machine("n2", "h2", Some("m2")));
        world.hardware.insert(hardware("h2", "p1"));

        let err = world.reconcile("n2").await.unwrap_err();
        assert!(matches!(err, ControllerError::MachineVersionEmpty));
        assert_eq!(err.class(), ErrorClass::Configuration);
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_secret_without_value_key() {
        let world = TestWorld::new();
        world.seed_upstream();
        world.secrets.insert(bootstrap_secret("b1", None));
        seed_node(&world, Some("m1"));

        let err = world.reconcile("n1").await.unwrap_err();
        assert!(matches!(err, ControllerError::MissingBootstrapKey(_)));
        assert_eq!(err.class(), ErrorClass::Data);
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_bootstrap_data() {
        let world = TestWorld::new();
        world.seed_upstream();
        world.secrets.insert(bootstrap_secret("b1", Some(b"")));
        seed_node(&world, Some("m1"));

        let err = world.reconcile("n1").await.unwrap_err();
        assert!(matches!(err, ControllerError::EmptyBootstrapData(_)));
        assert_eq!(err.class(), ErrorClass::Data);
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_cluster_name_label() {
        let world = TestWorld::new();
        world.seed_upstream();
        world
            .capi_machines
            .insert(capi_machine("m1", Some("b1"), Some(VERSION), None));
        seed_node(&world, Some("m1"));

        let err = world.reconcile("n1").await.unwrap_err();
        assert!(matches!(err, ControllerError::ClusterNameLabelMissing(name) if name == "m1"));
        assert!(world.journal.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_owner_machine_is_store_error() {
        let world = TestWorld::new();
        seed_node(&world, Some("m1"));

        let err = world.reconcile("n1").await.unwrap_err();
        assert!(matches!(&err, ControllerError::Store { source, .. } if source.is_not_found()));
        assert_eq!(err.class(), ErrorClass::Dependency);
        assert!(world.journal.writes().is_empty());
    }
}
