//! Views stay consistent through the mutate-cascade-broadcast loop.
//!
//! Each test wires real views to a coordinator the way the app does: a
//! subscription that recomputes its read model from a fresh snapshot on
//! every refresh signal. No server push is involved anywhere; consistency
//! comes purely from local application plus the broadcast.
//!
//! Time-windowed numbers (weekly completions, trend counts) depend on the
//! wall clock the backend stamps, so assertions here stick to structural
//! and count-based facts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crewdeck_core::{
    Coordinator, DepartmentDraft, DepartmentId, Liveness, MemberDraft, MemberId, MemoryBackend,
    Priority, ProjectDraft, ProjectId, ProjectStatus, RefreshBus, RoleDraft, RoleId, Subscription,
    Tags, TaskDraft, TaskId, TaskStatus, UNKNOWN_LABEL,
};
use crewdeck_metrics::{DashboardSummary, ProjectDetail, TeamOverview};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

type Cell<T> = Arc<Mutex<Option<T>>>;

/// Route logs to the test writer; `CREWDECK_LOG` controls the filter.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("CREWDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn seed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 20, 9, 0, 0).unwrap()
}

/// One department, one role, two members, one active project, four tasks
/// (two of them done). Same org the core flow tests use.
fn seed_backend() -> MemoryBackend {
    let now = seed_time();
    let backend = MemoryBackend::new();

    backend.seed_department(
        DepartmentDraft {
            name: "Engineering".into(),
            description: String::new(),
        }
        .into_department(DepartmentId::new("d-1"), now),
    );
    backend.seed_role(
        RoleDraft {
            name: "Engineer".into(),
            description: String::new(),
        }
        .into_role(RoleId::new("r-1"), now),
    );
    for (id, name, email) in [
        ("m-1", "Ada", "ada@example.com"),
        ("m-2", "Grace", "grace@example.com"),
    ] {
        backend.seed_member(
            MemberDraft {
                name: name.into(),
                email: email.into(),
                role_id: Some(RoleId::new("r-1")),
                department_id: Some(DepartmentId::new("d-1")),
                ..MemberDraft::default()
            }
            .into_member(MemberId::new(id), now),
        );
    }
    backend.seed_project(
        ProjectDraft {
            name: "Apollo".into(),
            description: String::new(),
            status: ProjectStatus::Active,
            priority: Priority::High,
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid start date"),
            end_date: None,
            manager_id: Some(MemberId::new("m-1")),
            department_id: Some(DepartmentId::new("d-1")),
            budget: Some(10_000.0),
            tags: Tags::new(),
        }
        .into_project(ProjectId::new("p-1"), now),
    );
    for (id, title, status, assignee) in [
        ("t-1", "design review", TaskStatus::Done, "m-1"),
        ("t-2", "write docs", TaskStatus::Done, "m-1"),
        ("t-3", "wire backend", TaskStatus::InProgress, "m-1"),
        ("t-4", "polish ui", TaskStatus::Todo, "m-2"),
    ] {
        backend.seed_task(
            TaskDraft {
                title: title.into(),
                status,
                assignee_id: Some(MemberId::new(assignee)),
                project_id: Some(ProjectId::new("p-1")),
                ..TaskDraft::default()
            }
            .into_task(TaskId::new(id), now),
        );
    }

    backend
}

fn seeded_coordinator() -> Coordinator<MemoryBackend> {
    init_tracing();
    let coordinator = Coordinator::new(seed_backend());
    coordinator.hydrate().expect("hydrate should succeed");
    coordinator
}

fn count_signals(bus: &RefreshBus) -> (Arc<AtomicUsize>, Subscription) {
    let hits = Arc::new(AtomicUsize::new(0));
    let sub = bus.subscribe({
        let hits = Arc::clone(&hits);
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    });
    (hits, sub)
}

/// Mount a dashboard: recompute the summary from a fresh snapshot on every
/// refresh signal, exactly as the screen would.
fn mount_dashboard(coord: &Coordinator<MemoryBackend>) -> (Cell<DashboardSummary>, Subscription) {
    let store = coord.store();
    let cell: Cell<DashboardSummary> = Arc::default();
    let sub = coord.bus().subscribe({
        let cell = Arc::clone(&cell);
        move || {
            let summary = DashboardSummary::compute(&store.snapshot(), Utc::now(), 6);
            *cell.lock().unwrap() = Some(summary);
        }
    });
    (cell, sub)
}

fn mount_project_detail(
    coord: &Coordinator<MemoryBackend>,
    id: ProjectId,
) -> (Cell<ProjectDetail>, Subscription) {
    let store = coord.store();
    let cell: Cell<ProjectDetail> = Arc::default();
    let sub = coord.bus().subscribe({
        let cell = Arc::clone(&cell);
        move || {
            *cell.lock().unwrap() = ProjectDetail::compute(&store.snapshot(), &id);
        }
    });
    (cell, sub)
}

fn mount_team(coord: &Coordinator<MemoryBackend>) -> (Cell<TeamOverview>, Subscription) {
    let store = coord.store();
    let cell: Cell<TeamOverview> = Arc::default();
    let sub = coord.bus().subscribe({
        let cell = Arc::clone(&cell);
        move || {
            *cell.lock().unwrap() = Some(TeamOverview::compute(&store.snapshot()));
        }
    });
    (cell, sub)
}

fn taken<T: Clone>(cell: &Cell<T>) -> Option<T> {
    cell.lock().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn dashboard_tracks_each_mutation_through_the_signal() {
    let coord = seeded_coordinator();
    let live = Liveness::new();
    let (dashboard, _sub) = mount_dashboard(&coord);

    coord
        .create_task(
            &TaskDraft {
                title: "load test".into(),
                project_id: Some(ProjectId::new("p-1")),
                assignee_id: Some(MemberId::new("m-2")),
                ..TaskDraft::default()
            },
            &live,
        )
        .expect("create should apply");

    let seen = taken(&dashboard).expect("view refreshed");
    assert_eq!(seen.total_tasks, 5);
    assert_eq!(seen.completed_tasks, 2);
    assert_eq!(seen.total_projects, 1);
    assert_eq!(seen.active_projects, 1);
    assert_eq!(seen.weekly_activity.len(), 7);
    assert_eq!(seen.trend.len(), 6);

    let t3 = coord.store().task(&TaskId::new("t-3")).expect("t-3 hydrated");
    coord
        .update_task(
            &t3.id,
            &TaskDraft {
                title: t3.title.clone(),
                status: TaskStatus::Done,
                assignee_id: t3.assignee_id.clone(),
                project_id: t3.project_id.clone(),
                ..TaskDraft::default()
            },
            &live,
        )
        .expect("update should apply");

    let seen = taken(&dashboard).expect("view refreshed again");
    assert_eq!(seen.total_tasks, 5);
    assert_eq!(seen.completed_tasks, 3);
}

#[test]
fn one_mutation_refreshes_every_view_consistently() {
    let coord = seeded_coordinator();
    let live = Liveness::new();
    let project = ProjectId::new("p-1");

    let (signals, _s0) = count_signals(&coord.bus());
    let (dashboard, _s1) = mount_dashboard(&coord);
    let (detail, _s2) = mount_project_detail(&coord, project.clone());
    let (team, _s3) = mount_team(&coord);

    let t3 = coord.store().task(&TaskId::new("t-3")).expect("t-3 hydrated");
    let receipt = coord
        .update_task(
            &t3.id,
            &TaskDraft {
                title: t3.title.clone(),
                status: TaskStatus::Done,
                assignee_id: t3.assignee_id.clone(),
                project_id: t3.project_id.clone(),
                ..TaskDraft::default()
            },
            &live,
        )
        .expect("update should apply")
        .applied()
        .expect("not stale");

    assert_eq!(signals.load(Ordering::SeqCst), 1);

    let dashboard = taken(&dashboard).expect("dashboard refreshed");
    assert_eq!(dashboard.completed_tasks, 3);

    let detail = taken(&detail).expect("project detail refreshed");
    assert_eq!(detail.stats.total_tasks, 4);
    assert_eq!(detail.stats.completed_tasks, 3);
    assert_eq!(detail.stats.progress, 75);

    // The view recomputed exactly what the cascade receipt reported.
    let (_, cascade_stats) = receipt
        .cascade
        .project_stats
        .iter()
        .find(|(id, _)| id == &project)
        .expect("project stats recomputed")
        .clone();
    assert_eq!(detail.stats, cascade_stats);

    let team = taken(&team).expect("team view refreshed");
    let ada = team
        .members
        .iter()
        .find(|row| row.member.id.as_str() == "m-1")
        .expect("Ada listed");
    assert_eq!(ada.tasks, 3);
    assert_eq!(ada.role_name, "Engineer");
}

#[test]
fn coalesced_burst_renders_once_with_final_numbers() {
    let coord = seeded_coordinator();
    let live = Liveness::new();
    let (renders, _s0) = count_signals(&coord.bus());
    let (dashboard, _s1) = mount_dashboard(&coord);

    coord.bus().coalesce(|| {
        coord
            .create_task(
                &TaskDraft {
                    title: "sweep logs".into(),
                    project_id: Some(ProjectId::new("p-1")),
                    ..TaskDraft::default()
                },
                &live,
            )
            .expect("create should apply");
        coord
            .create_task(
                &TaskDraft {
                    title: "rotate keys".into(),
                    ..TaskDraft::default()
                },
                &live,
            )
            .expect("create should apply");
        coord
            .delete_task(&TaskId::new("t-4"), &live)
            .expect("delete should apply");
    });

    assert_eq!(renders.load(Ordering::SeqCst), 1);
    let seen = taken(&dashboard).expect("view refreshed");
    assert_eq!(seen.total_tasks, 5);

    // The single render already shows the end state of the whole burst.
    let direct = DashboardSummary::compute(&coord.store().snapshot(), Utc::now(), 6);
    assert_eq!(seen.total_tasks, direct.total_tasks);
    assert_eq!(seen.completed_tasks, direct.completed_tasks);
}

#[test]
fn views_survive_deleting_a_referenced_member() {
    let coord = seeded_coordinator();
    let live = Liveness::new();
    let (dashboard, _s1) = mount_dashboard(&coord);
    let (detail, _s2) = mount_project_detail(&coord, ProjectId::new("p-1"));
    let (team, _s3) = mount_team(&coord);

    // Ada manages the project and holds three tasks.
    coord
        .delete_member(&MemberId::new("m-1"), &live)
        .expect("delete should apply");

    let dashboard = taken(&dashboard).expect("dashboard refreshed");
    assert_eq!(dashboard.total_tasks, 4);

    let detail = taken(&detail).expect("detail refreshed");
    assert_eq!(detail.manager_name, UNKNOWN_LABEL);
    assert_eq!(detail.tasks.len(), 4);

    let team = taken(&team).expect("team refreshed");
    assert_eq!(team.members.len(), 1);
    assert_eq!(team.members[0].member.name, "Grace");
    assert_eq!(team.members[0].tasks, 1);
}

#[test]
fn stale_writes_never_refresh_views() {
    let coord = seeded_coordinator();
    let live = Liveness::new();
    let (dashboard, _sub) = mount_dashboard(&coord);

    live.revoke();
    let outcome = coord
        .update_task(
            &TaskId::new("t-4"),
            &TaskDraft {
                title: "polish ui (reworded)".into(),
                project_id: Some(ProjectId::new("p-1")),
                assignee_id: Some(MemberId::new("m-2")),
                ..TaskDraft::default()
            },
            &live,
        )
        .expect("no error for stale writes");

    assert!(outcome.is_stale());
    assert!(taken(&dashboard).is_none());
}
