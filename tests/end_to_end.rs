use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use http::{Request, Response};
use plot_composer::render::{ChartRenderer, RenderAdapter};
use plot_composer::state::{Aggregation, Mapping};
use plot_composer::{
    ClientConfig, DataFile, Result, Session, SessionPhase, StateUpdate, Transport,
    VisualizationState,
};
use serde_json::{Value, json};

const WAIT: Duration = Duration::from_secs(5);

/// In-memory backend: canned responses, recorded requests
#[derive(Default)]
struct Backend {
    responses: VecDeque<(u16, Value)>,
    requests: Vec<(String, String, Vec<u8>)>,
}

impl Transport for Backend {
    fn send(&mut self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        self.requests.push((
            request.method().to_string(),
            request.uri().path().to_string(),
            request.body().clone(),
        ));
        let (status, body) = self.responses.pop_front().unwrap_or((500, json!({})));
        Ok(Response::builder()
            .status(status)
            .body(serde_json::to_vec(&body)?)?)
    }
}

#[derive(Default)]
struct Canvas {
    plots: Vec<(Vec<Value>, Value)>,
}

impl RenderAdapter for Canvas {
    fn new_plot(&mut self, data: &[Value], layout: &Value, _options: &Value) -> Result<()> {
        self.plots.push((data.to_vec(), layout.clone()));
        Ok(())
    }
}

const SALES: &str = "month,sales\nJan,10\nFeb,20\n";

#[test]
fn month_sales_bar_chart() {
    let mut state = VisualizationState::new();
    state
        .set_data_source(&DataFile::new("sales.csv", SALES))
        .unwrap();
    state.set_state(
        StateUpdate::new()
            .chart_type("bar")
            .x_axis(Some("month"))
            .y_axis(Some("sales")),
    );
    assert!(state.wait_idle(WAIT));

    let config = &state.state().plotly_config;
    let traces = config["data"].as_array().unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0]["x"], json!(["Jan", "Feb"]));
    assert_eq!(traces[0]["y"], json!([10, 20]));
    assert_eq!(traces[0]["type"], json!("bar"));
    assert_eq!(config["layout"]["xaxis"]["title"], json!("month"));
    assert_eq!(config["layout"]["yaxis"]["title"], json!("sales"));
    assert_eq!(config["layout"]["xaxis"]["type"], json!("category"));
}

#[test]
fn subscribers_drive_the_renderer() {
    let renderer = Rc::new(RefCell::new(ChartRenderer::with_delay(
        Canvas::default(),
        Duration::ZERO,
    )));
    let mut state = VisualizationState::new();

    let target = renderer.clone();
    state.subscribe(move |snapshot| {
        if snapshot.loading {
            return Ok(());
        }
        target.borrow_mut().render(&snapshot.plotly_config)
    });

    state
        .set_data_source(&DataFile::new("sales.csv", SALES))
        .unwrap();
    state.set_mapping(Mapping {
        x: Some("month".to_string()),
        y: Some("sales".to_string()),
        group_by: None,
        aggregation: Aggregation::Sum,
    });
    assert!(state.wait_idle(WAIT));

    let renderer = renderer.borrow();
    let (data, layout) = renderer.adapter().plots.last().unwrap();
    assert_eq!(data[0]["y"], json!([10, 20]));
    assert_eq!(layout["hovermode"], json!("closest"));
}

#[test]
fn upload_save_and_reopen() {
    let mut backend = Backend::default();
    backend.responses.extend([
        (200, json!({ "filename": "sales_1.csv" })),
        (200, json!({ "id": 8, "message": "Visualization saved successfully" })),
    ]);

    let mut session = Session::new(backend, ClientConfig::default());
    session
        .upload(&DataFile::new("sales.csv", SALES))
        .unwrap();
    session.state_mut().set_state(
        StateUpdate::new()
            .name("Monthly sales")
            .chart_type("line")
            .x_axis(Some("month"))
            .y_axis(Some("sales")),
    );
    assert!(session.state_mut().wait_idle(WAIT));
    assert_eq!(session.state().phase(), SessionPhase::Dirty);

    let id = session.save().unwrap();
    assert_eq!(id, 8);
    assert_eq!(session.state().phase(), SessionPhase::Saved);

    let saved = session.state().export_config();
    let mut reopened = VisualizationState::new();
    reopened
        .import_config(&serde_json::to_value(&saved).unwrap())
        .unwrap();
    assert_eq!(reopened.export_config(), saved);
    assert_eq!(reopened.phase(), SessionPhase::Saved);
}
