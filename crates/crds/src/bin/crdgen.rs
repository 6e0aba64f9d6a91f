//! Prints the CRDs owned by this project as a multi-document YAML stream.
//!
//! Cluster API's `Machine` and `Cluster` come with Cluster API itself and are
//! not printed.

use crds::{BMC, Hardware, Template, TinkerbellCluster, TinkerbellMachine, Workflow};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [
        TinkerbellMachine::crd(),
        TinkerbellCluster::crd(),
        Hardware::crd(),
        Template::crd(),
        Workflow::crd(),
        BMC::crd(),
    ];

    for crd in crds {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }

    Ok(())
}
