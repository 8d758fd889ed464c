//! Semantic graph queries and the creation wait, driven against the
//! in-memory mock DOM.
//!
//! Run with: `cargo run --example graph_query_demo`

use std::sync::Arc;
use std::time::Duration;

use trazar::flows::{Clickable, Deletable, Hoverable, Selectable};
use trazar::{
    AppOptions, DiagramApp, MockDom, MockElement, PageHost, Selector, TrazarResult, WaitOptions,
};

trazar::diagram_node! {
    /// Manual task node of the example workflow language.
    pub struct TaskManual: "task:manual", capabilities = [Clickable, Hoverable, Selectable, Deletable];
}

trazar::diagram_edge! {
    pub struct WorkflowEdge: "edge";
}

fn seed(dom: &MockDom) {
    dom.insert(None, MockElement::new("svg").class("diagram-canvas"));
    dom.insert_under_selector(
        "svg.diagram-canvas",
        MockElement::new("g")
            .id("svgr_task_Push")
            .class("node")
            .attr("data-diagram-type", "task:manual"),
    );
    dom.insert(
        Some("svgr_task_Push"),
        MockElement::new("text").class("label").text("Push"),
    );
}

#[tokio::main]
async fn main() -> TrazarResult<()> {
    let dom = MockDom::new();
    seed(&dom);
    dom.mark_api_ready();

    TaskManual::register();
    WorkflowEdge::register();

    let app = DiagramApp::start(
        Arc::new(dom.clone()),
        Arc::new(PageHost::new()),
        AppOptions::default(),
    )
    .await?;
    let graph = app.graph();

    // label-based lookup with strict cardinality
    let push: TaskManual = graph.get_node_by_label("Push").await?;
    println!("found node: {}", push.dom_id().await?);

    // creation wait: snapshot, trigger, two-phase settle, diff
    let background = dom.clone();
    let created: Vec<TaskManual> = graph
        .wait_for_creation_of_type(
            || async move {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    background.insert_under_selector(
                        "svg.diagram-canvas",
                        MockElement::new("g")
                            .id("svgr_task_New")
                            .class("node")
                            .class("ghost")
                            .attr("data-diagram-type", "task:manual"),
                    );
                    tokio::time::sleep(Duration::from_millis(60)).await;
                    background.remove_class("svgr_task_New", "ghost");
                });
                Ok(())
            },
            &WaitOptions::default(),
        )
        .await?;
    println!("created: {}", created[0].dom_id().await?);

    // keyboard deletion waits for full detachment
    let doomed: TaskManual = graph
        .get_element(Selector::id("svgr_task_New"))
        .await?;
    doomed.delete_by_keyboard().await?;
    println!("deleted; remaining tasks: {}", graph.get_elements_of_type::<TaskManual>().await?.len());

    app.close().await
}
