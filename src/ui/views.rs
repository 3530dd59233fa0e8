use std::{collections::BTreeMap, ops::Range};

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::{
    dispatcher::{AppState, ViewState},
    features::{
        detail::DetailPane,
        list::{FilterState, ListItem, ListModel},
        log_viewer::LogViewer,
        multi_log_viewer::MultiLogLine,
    },
    kube::{DeploymentSummary, EventSummary, PodDetail, PodSummary, ServiceSummary},
    remote::NodeInfo,
};

use super::theme;

const COLUMN_SPACING: u16 = 2;

pub fn render_view(f: &mut Frame, area: Rect, state: &AppState) {
    match state.view {
        ViewState::ConfigSelect => render_list(
            f,
            area,
            "Clusters",
            &state.clusters,
            &["NAME", "KUBECONFIG", "CONTEXT"],
            &[Constraint::Percentage(25), Constraint::Fill(1), Constraint::Percentage(25)],
            |entry| {
                vec![
                    Cell::from(entry.name.as_str()),
                    Cell::from(entry.path.display().to_string()),
                    Cell::from(entry.context.as_deref().unwrap_or("-")),
                ]
            },
        ),
        ViewState::Connecting | ViewState::SshConnecting => render_connecting(f, area, state),
        ViewState::Main => render_main(f, area, state),
        ViewState::Namespaces => render_list(
            f,
            area,
            "Namespaces",
            &state.namespaces,
            &["NAME", "STATUS", "AGE"],
            &[Constraint::Fill(1), Constraint::Length(12), Constraint::Length(8)],
            |ns| {
                let current = state.namespace() == Some(ns.name.as_str());
                let name = if current {
                    format!("{} *", ns.name)
                } else {
                    ns.name.clone()
                };

                vec![
                    Cell::from(name),
                    Cell::from(ns.status.as_str()),
                    Cell::from(ns.age.as_str()),
                ]
            },
        ),
        ViewState::Pods => render_pods(f, area, state),
        ViewState::PodDetails => render_detail(f, area, "Pod", &state.pod_detail, pod_lines),
        ViewState::Logs => render_logs(f, area, &state.log_viewer),
        ViewState::MultiPodLogs => render_multi_logs(f, area, state),
        ViewState::Deployments => render_list(
            f,
            area,
            "Deployments",
            &state.deployments,
            &["NAME", "READY", "UP-TO-DATE", "AVAILABLE", "AGE"],
            &[
                Constraint::Fill(1),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Length(9),
                Constraint::Length(8),
            ],
            |deployment| {
                vec![
                    Cell::from(deployment.name.as_str()),
                    Cell::from(deployment.ready_column()),
                    Cell::from(deployment.updated.to_string()),
                    Cell::from(deployment.available.to_string()),
                    Cell::from(deployment.age.as_str()),
                ]
            },
        ),
        ViewState::DeploymentDetails => render_detail(
            f,
            area,
            "Deployment",
            &state.deployment_detail,
            deployment_lines,
        ),
        ViewState::Services => render_list(
            f,
            area,
            "Services",
            &state.services,
            &["NAME", "TYPE", "CLUSTER-IP", "PORTS", "AGE"],
            &[
                Constraint::Fill(1),
                Constraint::Length(12),
                Constraint::Length(16),
                Constraint::Percentage(25),
                Constraint::Length(8),
            ],
            |service| {
                vec![
                    Cell::from(service.name.as_str()),
                    Cell::from(service.type_.as_str()),
                    Cell::from(service.cluster_ip.as_str()),
                    Cell::from(service.ports.join(",")),
                    Cell::from(service.age.as_str()),
                ]
            },
        ),
        ViewState::ServiceDetails => {
            render_detail(f, area, "Service", &state.service_detail, service_lines)
        }
        ViewState::Events => render_events(f, area, state),
        ViewState::SshHosts => render_list(
            f,
            area,
            "Hosts",
            &state.hosts,
            &["NAME", "DESTINATION", "SUDO"],
            &[Constraint::Percentage(30), Constraint::Fill(1), Constraint::Length(5)],
            |host| {
                vec![
                    Cell::from(host.name.as_str()),
                    Cell::from(host.destination()),
                    Cell::from(if host.sudo { "yes" } else { "no" }),
                ]
            },
        ),
        ViewState::RemoteContainers => render_list(
            f,
            area,
            "Containers",
            &state.remote_containers,
            &["CONTAINER", "NAME", "STATE", "ATTEMPT", "POD", "AGE"],
            &[
                Constraint::Length(14),
                Constraint::Percentage(25),
                Constraint::Length(8),
                Constraint::Length(7),
                Constraint::Fill(1),
                Constraint::Length(8),
            ],
            |container| {
                vec![
                    Cell::from(container.short_id()),
                    Cell::from(container.name.as_str()),
                    Cell::from(container.state.to_string())
                        .style(theme::container_state(container.state)),
                    Cell::from(container.attempt.to_string()),
                    Cell::from(container.pod.as_deref().unwrap_or("-")),
                    Cell::from(container.age.as_str()),
                ]
            },
        ),
        ViewState::RemoteLogs => render_logs(f, area, &state.remote_log_viewer),
        ViewState::NodeInfo => render_detail(f, area, "Node", &state.node_info, node_lines),
    }
}

fn block(title: impl Into<Line<'static>>) -> Block<'static> {
    Block::bordered()
        .title(title)
        .title_style(theme::title())
        .border_style(theme::border())
}

/// With metrics on, CPU/MEM columns show the last fetched usage, `-` until it arrives.
fn render_pods(f: &mut Frame, area: Rect, state: &AppState) {
    let status = |pod: &PodSummary| {
        vec![
            Cell::from(pod.name.clone()),
            Cell::from(pod.ready.clone()),
            Cell::from(pod.status.clone()).style(theme::status(&pod.status)),
            Cell::from(pod.restarts.to_string()),
        ]
    };

    if !state.metrics_enabled {
        render_list(
            f,
            area,
            "Pods",
            &state.pods,
            &["NAME", "READY", "STATUS", "RESTARTS", "AGE"],
            &[
                Constraint::Fill(1),
                Constraint::Length(7),
                Constraint::Length(18),
                Constraint::Length(8),
                Constraint::Length(8),
            ],
            |pod| {
                let mut cells = status(pod);
                cells.push(Cell::from(pod.age.clone()));
                cells
            },
        );

        return;
    }

    let usage = |pod: &PodSummary| {
        state
            .pod_metrics
            .as_ref()
            .and_then(|metrics| metrics.get(&pod.name))
    };

    render_list(
        f,
        area,
        "Pods [metrics]",
        &state.pods,
        &["NAME", "READY", "STATUS", "RESTARTS", "CPU", "MEMORY", "AGE"],
        &[
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
        |pod| {
            let (cpu, memory) = usage(pod)
                .map(|usage| (usage.cpu(), usage.memory()))
                .unwrap_or_else(|| ("-".to_string(), "-".to_string()));

            let mut cells = status(pod);
            cells.push(Cell::from(cpu));
            cells.push(Cell::from(memory));
            cells.push(Cell::from(pod.age.clone()));
            cells
        },
    );
}

/// Table over the visible rows of `model`, with the filter prompt underneath
/// while a filter is set.
fn render_list<'a, T: ListItem>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    model: &'a ListModel<T>,
    header: &[&'static str],
    widths: &[Constraint],
    row: impl Fn(&'a T) -> Vec<Cell<'a>>,
) {
    let (table_area, filter_area) = match model.filter() {
        FilterState::Off => (area, None),
        _ => {
            let [table, filter] =
                Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
            (table, Some(filter))
        }
    };

    let rows: Vec<Row> = model.visible_items().map(|item| Row::new(row(item))).collect();

    let title = format!(" {} [{}/{}] ", title, model.visible_len(), model.items().len());

    let table = Table::new(rows, widths.to_vec())
        .header(Row::new(header.to_vec()).style(theme::header()))
        .column_spacing(COLUMN_SPACING)
        .row_highlight_style(theme::highlight())
        .block(block(title));

    let mut table_state = TableState::default().with_selected(model.selected_index());

    f.render_stateful_widget(table, table_area, &mut table_state);

    if let Some(filter_area) = filter_area {
        let query = model.filter().query().unwrap_or_default();

        let mut line = Line::from(vec![
            Span::styled("filter: ", theme::muted()),
            Span::raw(query.to_string()),
        ]);

        if model.is_filter_editing() {
            line.push_span(Span::styled(" ", theme::highlight()));
        }

        f.render_widget(Paragraph::new(line), filter_area);
    }
}

fn render_detail<T>(
    f: &mut Frame,
    area: Rect,
    title: &str,
    pane: &DetailPane<T>,
    lines: fn(&T) -> Vec<Line<'static>>,
) {
    let content = match pane.item() {
        Some(item) => lines(item),
        None => vec![Line::styled("No data", theme::muted())],
    };

    f.render_widget(
        Paragraph::new(content)
            .scroll((pane.scroll(), 0))
            .wrap(Wrap { trim: false })
            .block(block(format!(" {} ", title))),
        area,
    );
}

fn field(name: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", name), theme::header()),
        Span::raw(value.into()),
    ])
}

fn section(name: &str) -> [Line<'static>; 2] {
    [Line::default(), Line::styled(name.to_string(), theme::title())]
}

fn labels(map: &BTreeMap<String, String>) -> String {
    if map.is_empty() {
        return "<none>".to_string();
    }

    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn event_line(event: &EventSummary) -> Line<'static> {
    let style = if event.is_warning() {
        theme::warning()
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(format!("{:<8}", event.age), theme::muted()),
        Span::styled(format!("{:<8} ", event.type_), style),
        Span::styled(format!("{:<20} ", event.reason), style),
        Span::raw(event.message.clone()),
    ])
}

fn pod_lines(detail: &PodDetail) -> Vec<Line<'static>> {
    let pod = &detail.summary;

    let mut lines = vec![
        field("Name", pod.name.clone()),
        field("Namespace", pod.namespace.clone()),
        Line::from(vec![
            Span::styled(format!("{:<12}", "Status"), theme::header()),
            Span::styled(pod.status.clone(), theme::status(&pod.status)),
        ]),
        field("Ready", pod.ready.clone()),
        field("Restarts", pod.restarts.to_string()),
        field("Node", pod.node.clone().unwrap_or_else(|| "-".to_string())),
        field("IP", pod.ip.clone().unwrap_or_else(|| "-".to_string())),
        field("Age", pod.age.clone()),
        field("Labels", labels(&detail.labels)),
    ];

    lines.extend(section("Containers"));
    lines.extend(detail.containers.iter().flat_map(|c| {
        [
            Line::from(vec![
                Span::raw(format!("  {} ", c.name)),
                Span::styled(c.state.clone(), theme::status(&c.state)),
            ]),
            Line::styled(
                format!("    image: {}  ready: {}  restarts: {}", c.image, c.ready, c.restarts),
                theme::muted(),
            ),
        ]
    }));

    if !detail.conditions.is_empty() {
        lines.extend(section("Conditions"));
        lines.extend(
            detail
                .conditions
                .iter()
                .map(|(kind, status)| Line::raw(format!("  {:<20}{}", kind, status))),
        );
    }

    lines.extend(section("Events"));

    if detail.events.is_empty() {
        lines.push(Line::styled("  <none>", theme::muted()));
    } else {
        lines.extend(detail.events.iter().map(event_line));
    }

    lines
}

fn deployment_lines(deployment: &DeploymentSummary) -> Vec<Line<'static>> {
    let mut lines = vec![
        field("Name", deployment.name.clone()),
        field("Namespace", deployment.namespace.clone()),
        field(
            "Replicas",
            format!(
                "{} desired | {} updated | {} ready | {} available",
                deployment.replicas, deployment.updated, deployment.ready, deployment.available
            ),
        ),
        field(
            "Strategy",
            deployment.strategy.clone().unwrap_or_else(|| "-".to_string()),
        ),
        field("Selector", labels(&deployment.selector)),
        field("Age", deployment.age.clone()),
    ];

    lines.extend(section("Images"));
    lines.extend(
        deployment
            .images
            .iter()
            .map(|image| Line::raw(format!("  {}", image))),
    );

    lines
}

fn service_lines(service: &ServiceSummary) -> Vec<Line<'static>> {
    let external = if service.external_ips.is_empty() {
        "<none>".to_string()
    } else {
        service.external_ips.join(",")
    };

    let mut lines = vec![
        field("Name", service.name.clone()),
        field("Namespace", service.namespace.clone()),
        field("Type", service.type_.clone()),
        field("ClusterIP", service.cluster_ip.clone()),
        field("ExternalIP", external),
        field("Selector", labels(&service.selector)),
        field("Age", service.age.clone()),
    ];

    lines.extend(section("Ports"));
    lines.extend(
        service
            .ports
            .iter()
            .map(|port| Line::raw(format!("  {}", port))),
    );

    lines
}

fn node_lines(info: &NodeInfo) -> Vec<Line<'static>> {
    info.rows()
        .into_iter()
        .map(|(name, value)| field(name, value.to_string()))
        .collect()
}

fn highlight(line: &str, ranges: &[Range<usize>], style: Style) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = 0;

    for range in ranges {
        spans.push(Span::raw(line[rest..range.start].to_string()));
        spans.push(Span::styled(line[range.clone()].to_string(), style));
        rest = range.end;
    }

    spans.push(Span::raw(line[rest..].to_string()));

    Line::from(spans)
}

fn render_logs(f: &mut Frame, area: Rect, viewer: &LogViewer) {
    let height = area.height.saturating_sub(2) as usize;
    let first = viewer.first_visible(height);
    let current = viewer.current_match();

    let lines: Vec<Line> = viewer
        .lines()
        .iter()
        .enumerate()
        .skip(first)
        .take(height)
        .map(|(index, line)| {
            if !viewer.is_match(index) {
                return Line::raw(line.as_str());
            }

            let style = if Some(index) == current {
                theme::current_match()
            } else {
                theme::search_match()
            };

            highlight(line, &viewer.match_ranges(line), style)
        })
        .collect();

    let mut flags = Vec::new();

    if viewer.is_following() {
        flags.push("follow".to_string());
    }

    if viewer.timestamps() {
        flags.push("timestamps".to_string());
    }

    if let (Some(query), Some(status)) = (viewer.search_query(), viewer.search_status()) {
        flags.push(format!("/{} {}", query, status));
    }

    let mut title = format!(" {} ", viewer.title());

    if !flags.is_empty() {
        title.push_str(&format!("[{}] ", flags.join(" ")));
    }

    f.render_widget(Paragraph::new(lines).block(block(title)), area);
}

fn render_multi_logs(f: &mut Frame, area: Rect, state: &AppState) {
    let viewer = &state.multi_log_viewer;
    let height = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = viewer
        .lines()
        .iter()
        .skip(viewer.first_visible(height))
        .take(height)
        .map(|line| match line {
            MultiLogLine::Header(header) => Line::styled(header.as_str(), theme::log_header()),
            MultiLogLine::Line(line) => Line::raw(line.as_str()),
        })
        .collect();

    let mut title = format!(
        " Logs of {} pods ({} streaming) ",
        viewer.sources().len(),
        state.multi_stream.active_count()
    );

    if viewer.is_following() {
        title.push_str("[follow] ");
    }

    f.render_widget(Paragraph::new(lines).block(block(title)), area);
}

fn render_events(f: &mut Frame, area: Rect, state: &AppState) {
    let viewer = &state.events;
    let events = viewer.visible();

    let rows: Vec<Row> = events
        .iter()
        .skip(viewer.scroll())
        .map(|event| {
            let style = if event.is_warning() {
                theme::warning()
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(event.age.as_str()),
                Cell::from(event.type_.as_str()).style(style),
                Cell::from(event.reason.as_str()),
                Cell::from(event.object()),
                Cell::from(event.message.as_str()),
            ])
        })
        .collect();

    let mut flags = vec![format!("kind: {}", viewer.kind_filter().unwrap_or("all"))];

    if viewer.warnings_only() {
        flags.push("warnings".to_string());
    }

    if viewer.is_following() {
        flags.push("follow".to_string());
    }

    let title = format!(" Events [{}] ({}) ", events.len(), flags.join(" "));

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(20),
            Constraint::Percentage(25),
            Constraint::Fill(1),
        ],
    )
    .header(Row::new(["AGE", "TYPE", "REASON", "OBJECT", "MESSAGE"]).style(theme::header()))
    .column_spacing(COLUMN_SPACING)
    .block(block(title));

    f.render_widget(table, area);
}

fn render_connecting(f: &mut Frame, area: Rect, state: &AppState) {
    let spinner = theme::SPINNER[state.spinner % theme::SPINNER.len()];

    let target = match state.view {
        ViewState::SshConnecting => state.remote.as_ref().map(|r| r.host.destination()),
        _ => state.selected_config.as_ref().map(|c| c.name.clone()),
    }
    .unwrap_or_default();

    let text = vec![
        Line::default(),
        Line::from(format!("{} Connecting to {} ...", spinner, target)).centered(),
        Line::styled("ctrl+c: quit", theme::muted()).centered(),
    ];

    f.render_widget(Paragraph::new(text).block(block(" Connecting ")), area);
}

fn render_main(f: &mut Frame, area: Rect, state: &AppState) {
    let mut text = vec![Line::default()];

    match &state.cluster {
        Some(session) => {
            text.push(field("Cluster", session.info.name.clone()));
            text.push(field("Context", session.info.context.clone()));
            text.push(field("Server", session.info.server.clone()));
            text.push(field("Namespace", session.info.namespace.clone()));
        }
        None => {
            text.push(Line::raw("Not connected."));

            if state.selected_config.is_some() {
                text.push(Line::styled("r: retry", theme::key_hint()));
            }
        }
    }

    f.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(block(" kubenav ")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(line: &Line) -> Vec<(String, bool)> {
        line.spans
            .iter()
            .map(|span| (span.content.to_string(), span.style == theme::search_match()))
            .collect()
    }

    #[test]
    fn 検索にヒットした範囲だけを強調する() {
        let line = "GET /Health 200 health";

        let highlighted = highlight(line, &[5..11, 16..22], theme::search_match());

        assert_eq!(
            text(&highlighted),
            vec![
                ("GET /".to_string(), false),
                ("Health".to_string(), true),
                (" 200 ".to_string(), false),
                ("health".to_string(), true),
                ("".to_string(), false),
            ]
        );
    }

    #[test]
    fn ラベルはキー順に連結する() {
        let map = BTreeMap::from([
            ("tier".to_string(), "web".to_string()),
            ("app".to_string(), "nginx".to_string()),
        ]);

        assert_eq!(labels(&map), "app=nginx,tier=web");
        assert_eq!(labels(&BTreeMap::new()), "<none>");
    }
}
