//! SQLite backend against real files.

use std::sync::Arc;

use math_service::algorithms::{factorial, fibonacci};
use math_service::db::{CalculationRepository, SqliteConfig, SqliteRepository, StatisticsRepository};
use math_service::models::{
    CalculationInput, CalculationResult, NewCalculation, Operation, PowerInput, SequenceInput,
};

fn open(dir: &tempfile::TempDir) -> SqliteRepository {
    let path = dir.path().join("math_calculations.db");
    SqliteRepository::new(SqliteConfig::with_url(path.to_string_lossy())).unwrap()
}

fn fibonacci_calc(n: i64) -> NewCalculation {
    NewCalculation {
        input_data: CalculationInput::Fibonacci(SequenceInput { n }),
        result: CalculationResult::Integer(fibonacci(n).unwrap()),
        execution_time_ms: 0.01,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

#[tokio::test]
async fn recent_returns_newest_first_capped_at_limit() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open(&dir);

    for n in 0..60 {
        repo.append_calculation(&fibonacci_calc(n)).await.unwrap();
    }

    let recent = repo.recent_calculations(50).await.unwrap();
    assert_eq!(recent.len(), 50);
    assert_eq!(recent[0].input_data, CalculationInput::Fibonacci(SequenceInput { n: 59 }));
    assert!(recent.windows(2).all(|w| w[0].id > w[1].id));

    let stats = repo.operation_stats().await.unwrap();
    assert_eq!(stats.total_calculations, 60);
    assert_eq!(stats.operations_count[&Operation::Fibonacci], 60);
}

#[tokio::test]
async fn records_round_trip_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open(&dir);

    let power = NewCalculation {
        input_data: CalculationInput::Power(PowerInput {
            base: 1.5,
            exponent: -2.25,
        }),
        result: CalculationResult::Float(1.5f64.powf(-2.25)),
        execution_time_ms: 0.12,
        timestamp: "2024-06-01T12:00:00+00:00".to_string(),
    };
    let fact = NewCalculation {
        input_data: CalculationInput::Factorial(SequenceInput { n: 100 }),
        result: CalculationResult::Integer(factorial(100).unwrap()),
        execution_time_ms: 0.3,
        timestamp: "2024-06-01T12:00:01+00:00".to_string(),
    };

    repo.append_calculation(&power).await.unwrap();
    repo.append_calculation(&fact).await.unwrap();

    let recent = repo.recent_calculations(10).await.unwrap();
    assert_eq!(recent[0].input_data, fact.input_data);
    assert_eq!(recent[0].result, fact.result);
    assert_eq!(recent[1].input_data, power.input_data);
    assert_eq!(recent[1].result, power.result);
    assert_eq!(recent[1].timestamp, power.timestamp);
    assert_eq!(recent[1].execution_time_ms, 0.12);
}

#[tokio::test]
async fn concurrent_appends_all_land_with_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(open(&dir));

    let mut tasks = Vec::new();
    for n in 0..32 {
        let repo = Arc::clone(&repo);
        tasks.push(tokio::spawn(async move {
            repo.append_calculation(&fibonacci_calc(n)).await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 32);
    assert_eq!(repo.count_calculations().await.unwrap(), 32);
}

#[tokio::test]
async fn clear_empties_history_and_stats() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open(&dir);
    for n in 0..3 {
        repo.append_calculation(&fibonacci_calc(n)).await.unwrap();
    }

    assert_eq!(repo.clear_calculations().await.unwrap(), 3);
    assert!(repo.recent_calculations(50).await.unwrap().is_empty());

    let stats = repo.operation_stats().await.unwrap();
    assert_eq!(stats.total_calculations, 0);
    assert!(stats.operations_count.is_empty());

    // Ids keep increasing after a clear.
    let next = repo.append_calculation(&fibonacci_calc(1)).await.unwrap();
    assert!(next.id.value() > 3);
}

#[test]
fn unopenable_path_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();

    let path = blocker.join("calc.db");
    let err = SqliteRepository::new(SqliteConfig::with_url(path.to_string_lossy()))
        .err()
        .unwrap();
    assert!(err.is_unavailable());
}
