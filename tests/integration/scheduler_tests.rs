//! Integration tests for the scheduler
//!
//! These tests drive the public API the way a seed layer and a pool of
//! workers would, using explicit instants where timing matters.

use ripple_frontier::config::{parse_config, SchedulerConfig};
use ripple_frontier::filter::from_fn;
use ripple_frontier::scheduler::FailureOutcome;
use ripple_frontier::{
    Priority, Rejection, Scheduler, TaskId, TaskMetadata, TaskStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Creates a test configuration without politeness delays
fn create_test_config() -> SchedulerConfig {
    SchedulerConfig {
        max_concurrent_tasks: 10,
        max_depth: 5,
        default_domain_delay: 0,
        ..SchedulerConfig::default()
    }
}

fn started(config: SchedulerConfig) -> Scheduler {
    let scheduler = Scheduler::new(config);
    scheduler.start();
    scheduler
}

fn add(scheduler: &Scheduler, url: &str, depth: u32, priority: Priority) -> Result<TaskId, Rejection> {
    scheduler.add_url(url, depth, priority, TaskMetadata::new(), None)
}

#[test]
fn test_duplicate_rejected_before_completion() {
    let scheduler = started(create_test_config());

    let first = add(&scheduler, "https://a.example/x", 0, Priority::Normal);
    let second = add(&scheduler, "https://a.example/x", 0, Priority::Normal);

    assert!(first.is_ok());
    assert!(matches!(second, Err(Rejection::Duplicate { .. })));
    assert_eq!(scheduler.tracked_tasks(), 1);
}

#[test]
fn test_concurrency_ceiling_of_one() {
    let scheduler = started(SchedulerConfig {
        max_concurrent_tasks: 1,
        ..create_test_config()
    });
    let task1 = add(&scheduler, "https://a.example/1", 0, Priority::Normal).unwrap();
    let task2 = add(&scheduler, "https://b.example/2", 0, Priority::Normal).unwrap();

    let dispatched = scheduler.next_task().unwrap();
    assert_eq!(dispatched.id, task1);
    assert_eq!(scheduler.task_status(&task1), Some(TaskStatus::Running));

    assert!(scheduler.next_task().is_none());

    scheduler.mark_completed(&task1, None, &[]).unwrap();
    assert_eq!(scheduler.next_task().unwrap().id, task2);
}

#[test]
fn test_retry_until_failed() {
    let scheduler = started(create_test_config());
    let id = add(&scheduler, "https://a.example/flaky", 0, Priority::Normal).unwrap();
    let mut now = Instant::now();

    for expected_retry in 1..=3 {
        let task = scheduler.next_task_at(now).unwrap();
        assert_eq!(task.id, id);

        let outcome = scheduler.mark_failed_at(&id, "timeout", true, now).unwrap();
        assert!(matches!(
            outcome,
            FailureOutcome::Retrying { retry_count, .. } if retry_count == expected_retry
        ));

        let task = scheduler.get_task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.retry_count, expected_retry);

        now += Duration::from_secs(60);
    }

    scheduler.next_task_at(now).unwrap();
    let outcome = scheduler.mark_failed_at(&id, "timeout", true, now);
    assert_eq!(outcome, Some(FailureOutcome::Failed));

    let task = scheduler.get_task(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.retry_count, 3);
    assert_eq!(task.error_message.as_deref(), Some("timeout"));
    assert!(scheduler.next_task_at(now).is_none());
}

#[test]
fn test_depth_beyond_max_creates_no_task() {
    let scheduler = started(create_test_config());

    let result = add(&scheduler, "https://a.example/deep", 6, Priority::Normal);

    assert_eq!(
        result,
        Err(Rejection::DepthExceeded {
            depth: 6,
            max_depth: 5
        })
    );
    assert_eq!(scheduler.tracked_tasks(), 0);
    assert!(scheduler.next_task().is_none());
}

#[test]
fn test_readmission_after_each_terminal_state() {
    let scheduler = started(create_test_config());
    let now = Instant::now();

    // COMPLETED
    let id = add(&scheduler, "https://a.example/done", 0, Priority::Normal).unwrap();
    scheduler.next_task_at(now).unwrap();
    scheduler.mark_completed(&id, None, &[]).unwrap();
    assert!(add(&scheduler, "https://a.example/done", 0, Priority::Normal).is_ok());

    // FAILED
    let id = add(&scheduler, "https://b.example/bad", 0, Priority::High).unwrap();
    scheduler.next_task_at(now).unwrap();
    scheduler.mark_failed_at(&id, "gone", false, now).unwrap();
    assert!(add(&scheduler, "https://b.example/bad", 0, Priority::Normal).is_ok());

    // CANCELLED
    let id = add(&scheduler, "https://c.example/stop", 0, Priority::Normal).unwrap();
    assert!(scheduler.cancel_task(&id));
    assert!(add(&scheduler, "https://c.example/stop", 0, Priority::Normal).is_ok());
}

#[test]
fn test_discovered_tasks_are_one_level_deeper() {
    let scheduler = started(create_test_config());
    add(&scheduler, "https://a.example/", 0, Priority::Normal).unwrap();

    let mut max_seen = 0;
    while let Some(task) = scheduler.next_task() {
        if let Some(parent_id) = &task.parent_task_id {
            let parent = scheduler.get_task(parent_id).unwrap();
            assert_eq!(task.depth, parent.depth + 1);
        }
        max_seen = max_seen.max(task.depth);

        let child = format!("https://a.example/level{}", task.depth + 1);
        scheduler.mark_completed(&task.id, None, &[child]).unwrap();
    }

    assert_eq!(max_seen, 5);
    let stats = scheduler.stats();
    assert_eq!(stats.completed, 6);
    assert_eq!(stats.rejected_depth, 1);
}

#[test]
fn test_running_tasks_never_exceed_ceiling() {
    let scheduler = started(SchedulerConfig {
        max_concurrent_tasks: 3,
        ..create_test_config()
    });
    for i in 0..10 {
        add(&scheduler, &format!("https://d{}.example/", i), 0, Priority::Normal).unwrap();
    }

    let mut running = Vec::new();
    while let Some(task) = scheduler.next_task() {
        running.push(task.id);
    }
    assert_eq!(running.len(), 3);
    assert_eq!(scheduler.stats().active, 3);

    scheduler.mark_failed(&running[0], "reset", false).unwrap();
    assert!(scheduler.next_task().is_some());
    assert!(scheduler.next_task().is_none());
    assert_eq!(scheduler.stats().active, 3);
}

#[test]
fn test_consecutive_dispatches_respect_domain_delay() {
    let mut overrides = HashMap::new();
    overrides.insert("slow.example".to_string(), 3000);
    let scheduler = started(SchedulerConfig {
        default_domain_delay: 500,
        domain_delay_overrides: overrides,
        ..create_test_config()
    });
    for i in 0..4 {
        add(&scheduler, &format!("https://slow.example/{}", i), 0, Priority::Normal).unwrap();
        add(&scheduler, &format!("https://fast.example/{}", i), 0, Priority::Normal).unwrap();
    }

    let start = Instant::now();
    let mut last_dispatch: HashMap<String, Instant> = HashMap::new();
    let mut dispatched = 0;
    let mut now = start;

    while dispatched < 8 {
        while let Some(task) = scheduler.next_task_at(now) {
            let delay = if task.domain == "slow.example" {
                Duration::from_millis(3000)
            } else {
                Duration::from_millis(500)
            };
            if let Some(previous) = last_dispatch.insert(task.domain.clone(), now) {
                assert!(now - previous >= delay, "{} dispatched too early", task.domain);
            }
            scheduler.mark_completed(&task.id, None, &[]).unwrap();
            dispatched += 1;
        }
        now += Duration::from_millis(100);
        assert!(now - start < Duration::from_secs(20), "crawl stalled");
    }
}

#[test]
fn test_wildcard_override_applies_to_subdomains() {
    let mut overrides = HashMap::new();
    overrides.insert("*.cdn.example".to_string(), 0);
    let scheduler = started(SchedulerConfig {
        default_domain_delay: 10_000,
        domain_delay_overrides: overrides,
        ..create_test_config()
    });
    add(&scheduler, "https://img.cdn.example/1", 0, Priority::Normal).unwrap();
    add(&scheduler, "https://img.cdn.example/2", 0, Priority::Normal).unwrap();
    let now = Instant::now();

    assert!(scheduler.next_task_at(now).is_some());
    assert!(scheduler.next_task_at(now).is_some());
}

#[test]
fn test_higher_priority_wins_when_both_eligible() {
    let scheduler = started(create_test_config());
    add(&scheduler, "https://a.example/low", 0, Priority::Low).unwrap();
    add(&scheduler, "https://a.example/normal", 0, Priority::Normal).unwrap();
    add(&scheduler, "https://a.example/high", 0, Priority::High).unwrap();

    let order: Vec<String> = std::iter::from_fn(|| scheduler.next_task())
        .map(|task| task.url)
        .collect();

    assert_eq!(
        order,
        vec![
            "https://a.example/high",
            "https://a.example/normal",
            "https://a.example/low",
        ]
    );
}

#[test]
fn test_rate_limited_high_does_not_block_other_domains() {
    let scheduler = started(SchedulerConfig {
        default_domain_delay: 1000,
        ..create_test_config()
    });
    add(&scheduler, "https://busy.example/1", 0, Priority::High).unwrap();
    add(&scheduler, "https://busy.example/2", 0, Priority::High).unwrap();
    add(&scheduler, "https://idle.example/", 0, Priority::Low).unwrap();
    let now = Instant::now();

    assert_eq!(scheduler.next_task_at(now).unwrap().url, "https://busy.example/1");
    assert_eq!(scheduler.next_task_at(now).unwrap().url, "https://idle.example/");
    assert!(scheduler.next_task_at(now).is_none());
    assert_eq!(
        scheduler
            .next_task_at(now + Duration::from_secs(1))
            .unwrap()
            .url,
        "https://busy.example/2"
    );
}

#[test]
fn test_registered_filter_vetoes_urls() {
    let scheduler = started(create_test_config());
    scheduler.register_filter(from_fn("no-query", |c| c.url.query().is_none()));

    assert!(add(&scheduler, "https://a.example/page", 0, Priority::Normal).is_ok());
    assert_eq!(
        add(&scheduler, "https://a.example/page?session=1", 0, Priority::Normal),
        Err(Rejection::Filtered {
            filter: "no-query".to_string()
        })
    );
}

#[test]
fn test_scheduler_from_toml_config() {
    let config = parse_config(
        r#"
seeds = ["https://docs.example.com/"]

[scheduler]
max-concurrent-tasks = 2
max-depth = 1
default-domain-delay = 0

[filters]
allowed-domains = ["*.example.com"]
deny-patterns = ['\.pdf$']
"#,
    )
    .unwrap();
    let scheduler = Scheduler::from_config(&config).unwrap();
    scheduler.start();

    for seed in &config.seeds {
        scheduler.add_seed(seed).unwrap();
    }
    let task = scheduler.next_task().unwrap();
    let completion = scheduler
        .mark_completed(
            &task.id,
            None,
            &[
                "https://docs.example.com/guide".to_string(),
                "https://docs.example.com/guide.pdf".to_string(),
                "https://elsewhere.org/".to_string(),
            ],
        )
        .unwrap();

    assert_eq!(completion.spawned.len(), 1);
    assert_eq!(completion.rejected, 2);
    assert_eq!(scheduler.stats().rejected_by_filter, 2);
}

#[test]
fn test_concurrent_producers_then_consumers() {
    let scheduler = Arc::new(started(SchedulerConfig {
        max_concurrent_tasks: 4,
        ..create_test_config()
    }));
    let peak_running = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                for i in 0..50 {
                    // Every producer also submits the shared URLs
                    let _ = add(&scheduler, &format!("https://shared.example/{}", i), 0, Priority::Normal);
                    let _ = add(
                        &scheduler,
                        &format!("https://p{}.example/{}", p, i),
                        0,
                        Priority::Normal,
                    );
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            let peak_running = Arc::clone(&peak_running);
            thread::spawn(move || {
                let mut done = 0;
                loop {
                    match scheduler.next_task() {
                        Some(task) => {
                            peak_running.fetch_max(scheduler.stats().active, Ordering::SeqCst);
                            scheduler.mark_completed(&task.id, None, &[]).unwrap();
                            done += 1;
                        }
                        None if scheduler.frontier_is_empty() => break,
                        None => thread::yield_now(),
                    }
                }
                done
            })
        })
        .collect();
    let completed: usize = consumers.into_iter().map(|c| c.join().unwrap()).sum();

    assert_eq!(completed, 250);
    let stats = scheduler.stats();
    assert_eq!(stats.discovered, 250);
    assert_eq!(stats.rejected_duplicate, 150);
    assert_eq!(stats.completed, 250);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.queued, 0);
    assert!(peak_running.load(Ordering::SeqCst) <= 4);
}

#[test]
fn test_producers_and_consumers_interleave() {
    let scheduler = Arc::new(started(SchedulerConfig {
        max_concurrent_tasks: 4,
        ..create_test_config()
    }));
    let producers_done = Arc::new(AtomicUsize::new(0));
    let child_attempts = Arc::new(AtomicU64::new(0));
    let peak_running = Arc::new(AtomicUsize::new(0));

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            let producers_done = Arc::clone(&producers_done);
            let child_attempts = Arc::clone(&child_attempts);
            let peak_running = Arc::clone(&peak_running);
            thread::spawn(move || {
                let mut done = 0u64;
                loop {
                    match scheduler.next_task() {
                        Some(task) => {
                            peak_running.fetch_max(scheduler.stats().active, Ordering::SeqCst);
                            let discovered = if task.depth == 0 {
                                vec![format!("{}/child", task.url)]
                            } else {
                                Vec::new()
                            };
                            child_attempts.fetch_add(discovered.len() as u64, Ordering::SeqCst);
                            let completion = scheduler
                                .mark_completed(&task.id, None, &discovered)
                                .unwrap();
                            assert_eq!(
                                completion.spawned.len() + completion.rejected,
                                discovered.len()
                            );
                            done += 1;
                        }
                        // No new work can appear once producers are finished
                        // and nothing is pending or running
                        None if producers_done.load(Ordering::SeqCst) == 4
                            && scheduler.frontier_is_empty() =>
                        {
                            break
                        }
                        None => thread::yield_now(),
                    }
                }
                done
            })
        })
        .collect();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let scheduler = Arc::clone(&scheduler);
            let producers_done = Arc::clone(&producers_done);
            thread::spawn(move || {
                for i in 0..60 {
                    let _ = add(&scheduler, &format!("https://p{}.example/{}", p, i), 0, Priority::Normal);
                    if i < 30 {
                        let _ = add(&scheduler, &format!("https://shared.example/{}", i), 0, Priority::High);
                    }
                }
                producers_done.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    let completed: u64 = consumers.into_iter().map(|c| c.join().unwrap()).sum();

    let stats = scheduler.stats();
    let attempts = 4 * 60 + 4 * 30 + child_attempts.load(Ordering::SeqCst);
    assert_eq!(stats.discovered + stats.filtered_out, attempts);
    assert_eq!(stats.filtered_out, stats.rejected_duplicate);

    // Every own URL and its child ran once; shared URLs ran at least once
    assert!(stats.discovered >= 2 * (4 * 60 + 30));
    assert_eq!(stats.completed, stats.discovered);
    assert_eq!(completed, stats.completed);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.queued, 0);
    assert!(peak_running.load(Ordering::SeqCst) <= 4);
}
