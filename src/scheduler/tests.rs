//! Scheduler Module Tests
//!
//! Exercises the engine through its public operations only: expression
//! creation, task leasing and result reporting. The drive helper plays the
//! role of a worker so the tests stay independent of which worker mode
//! (remote agent or in-process pool) is deployed.

#[cfg(test)]
mod tests {
    use crate::config::OperationTimes;
    use crate::ops;
    use crate::scheduler::manager::{SchedulerError, TaskManager};
    use crate::scheduler::protocol::{TaskPayload, TaskResult};
    use crate::scheduler::types::{ExpressionStatus, TaskId, TaskStatus};
    use std::sync::Arc;

    fn manager() -> Arc<TaskManager> {
        TaskManager::new(100, OperationTimes::default())
    }

    fn ok_result(id: &TaskId, value: f64) -> TaskResult {
        TaskResult {
            id: id.clone(),
            result: value,
            error: None,
        }
    }

    fn err_result(id: &TaskId, message: &str) -> TaskResult {
        TaskResult {
            id: id.clone(),
            result: 0.0,
            error: Some(message.to_string()),
        }
    }

    /// Computes leased tasks like a worker would until every expression is
    /// terminal. Every leased payload is checked for literal operands.
    fn drive(manager: &TaskManager, max_iterations: usize) {
        for _ in 0..max_iterations {
            if let Some(task) = manager.next_task() {
                assert_leased_args_are_literal(&task);
                let report = match ops::evaluate(&task.operation, &task.arg1, &task.arg2) {
                    Ok(value) => ok_result(&task.id, value),
                    Err(e) => err_result(&task.id, &e.to_string()),
                };
                manager.update_task_result(report).unwrap();
            }

            let (processing, _, _) = manager.expression_status_counts();
            if processing == 0 {
                return;
            }
        }
        panic!("expressions did not settle within {} iterations", max_iterations);
    }

    fn assert_leased_args_are_literal(task: &TaskPayload) {
        assert!(
            task.arg1.parse::<f64>().is_ok(),
            "leased arg1 is not a literal: {:?}",
            task.arg1
        );
        assert!(
            task.arg2.parse::<f64>().is_ok(),
            "leased arg2 is not a literal: {:?}",
            task.arg2
        );
    }

    // ============================================================
    // TEST 1: Expression creation
    // ============================================================

    #[test]
    fn test_create_expression_accepts_and_rejects() {
        let cases = [
            ("2+2", true),
            ("2+2*2", true),
            ("(2+2)*2", true),
            ("", false),
            ("2+", false),
            ("2+2@", false),
        ];

        for (input, want_ok) in cases {
            let m = manager();
            let outcome = m.create_expression(input);
            assert_eq!(outcome.is_ok(), want_ok, "input {:?}", input);
        }
    }

    #[test]
    fn test_rejected_expression_leaves_no_trace() {
        // ARRANGE
        let m = manager();

        // ACT
        let outcome = m.create_expression("2+");

        // ASSERT: no record, no tasks, nothing leasable
        assert!(outcome.is_err());
        assert!(m.list_expressions().is_empty());
        assert_eq!(m.task_count(), 0);
        assert!(m.next_task().is_none());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let m = manager();
        let first = m.create_expression("1+1").unwrap();
        let second = m.create_expression("2+2").unwrap();
        let third = m.create_expression("3+3").unwrap();

        let ids: Vec<u64> = [&first, &second, &third]
            .iter()
            .map(|id| id.parse::<u64>().unwrap())
            .collect();
        assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    }

    #[test]
    fn test_task_count_matches_operator_count() {
        let cases = [("2+2", 1), ("2+2*2", 2), ("(2+2)*2", 2), ("2+2*2+10/2", 4)];

        for (input, want_tasks) in cases {
            let m = manager();
            m.create_expression(input).unwrap();
            assert_eq!(m.task_count(), want_tasks, "input {:?}", input);
        }
    }

    #[test]
    fn test_single_number_completes_without_tasks() {
        let m = manager();
        let id = m.create_expression("5").unwrap();

        assert_eq!(m.task_count(), 0);
        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(5.0));
    }

    // ============================================================
    // TEST 2: Simple lease/report round trip ("2+2")
    // ============================================================

    #[test]
    fn test_simple_addition_end_to_end() {
        // ARRANGE
        let m = manager();
        let id = m.create_expression("2+2").unwrap();

        // ACT: exactly one task is leasable
        let task = m.next_task().expect("one task should be ready");
        assert_eq!(task.operation, "+");
        assert_eq!(task.arg1, "2");
        assert_eq!(task.arg2, "2");
        assert!(m.next_task().is_none());

        m.update_task_result(ok_result(&task.id, 4.0)).unwrap();

        // ASSERT
        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(4.0));
        assert!(expr.error.is_none());
    }

    // ============================================================
    // TEST 3: Dependency ordering ("2+2*2")
    // ============================================================

    #[test]
    fn test_precedence_orders_the_leases() {
        let m = manager();
        let id = m.create_expression("2+2*2").unwrap();
        assert_eq!(m.task_count(), 2);

        // The multiplication is the only resolvable task.
        let mult = m.next_task().expect("multiplication should be ready");
        assert_eq!(mult.operation, "*");
        assert_eq!(mult.arg1, "2");
        assert_eq!(mult.arg2, "2");

        // The addition depends on it and is deferred until then.
        assert!(m.next_task().is_none());

        m.update_task_result(ok_result(&mult.id, 4.0)).unwrap();

        let add = m.next_task().expect("addition should now be ready");
        assert_eq!(add.operation, "+");
        assert_eq!(add.arg1, "2");
        assert_eq!(add.arg2, "4");

        m.update_task_result(ok_result(&add.id, 6.0)).unwrap();

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(6.0));
    }

    #[test]
    fn test_parentheses_order_the_leases() {
        let m = manager();
        let id = m.create_expression("(2+2)*2").unwrap();

        let add = m.next_task().expect("addition should be ready");
        assert_eq!(add.operation, "+");
        m.update_task_result(ok_result(&add.id, 4.0)).unwrap();

        let mult = m.next_task().expect("multiplication should now be ready");
        assert_eq!(mult.operation, "*");
        assert_eq!(mult.arg1, "4");
        assert_eq!(mult.arg2, "2");
        m.update_task_result(ok_result(&mult.id, 8.0)).unwrap();

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(8.0));
    }

    // ============================================================
    // TEST 4: Error propagation ("2/0")
    // ============================================================

    #[test]
    fn test_division_by_zero_fails_the_expression() {
        let m = manager();
        let id = m.create_expression("2/0").unwrap();

        let task = m.next_task().unwrap();
        assert_eq!(task.operation, "/");

        m.update_task_result(err_result(&task.id, "division by zero"))
            .unwrap();

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Error);
        assert_eq!(expr.error.as_deref(), Some("division by zero"));
        assert!(expr.result.is_none());
    }

    #[test]
    fn test_failed_expression_tasks_are_not_served() {
        // "2/0+5*3": the division fails; the sibling multiplication and the
        // dependent addition must never reach a worker afterwards.
        let m = manager();
        let id = m.create_expression("2/0+5*3").unwrap();

        let div = m.next_task().unwrap();
        assert_eq!(div.operation, "/");
        m.update_task_result(err_result(&div.id, "division by zero"))
            .unwrap();

        assert!(m.next_task().is_none());
        assert_eq!(
            m.get_expression(&id).unwrap().status,
            ExpressionStatus::Error
        );
    }

    #[test]
    fn test_late_result_after_failure_is_accepted_without_effect() {
        let m = manager();
        let id = m.create_expression("6*7+2/0").unwrap();

        // Lease both resolvable tasks, fail the division first.
        let first = m.next_task().unwrap();
        let second = m.next_task().unwrap();
        let (mult, div) = if first.operation == "*" {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(div.operation, "/");

        m.update_task_result(err_result(&div.id, "division by zero"))
            .unwrap();
        assert_eq!(
            m.get_expression(&id).unwrap().status,
            ExpressionStatus::Error
        );

        // The in-flight multiplication still reports; the record takes the
        // result but the expression stays failed.
        m.update_task_result(ok_result(&mult.id, 42.0)).unwrap();

        let record = m.get_task(&mult.id).unwrap();
        assert_eq!(record.result, Some(42.0));
        assert_eq!(record.status, TaskStatus::Completed);

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Error);
        assert_eq!(expr.error.as_deref(), Some("division by zero"));
    }

    // ============================================================
    // TEST 5: Terminal states are sticky
    // ============================================================

    #[test]
    fn test_completed_expression_is_immutable() {
        let m = manager();
        let id = m.create_expression("2+2").unwrap();

        let task = m.next_task().unwrap();
        m.update_task_result(ok_result(&task.id, 4.0)).unwrap();
        assert_eq!(m.get_expression(&id).unwrap().result, Some(4.0));

        // Duplicate report: last writer wins on the task record, the
        // expression keeps its first terminal state.
        m.update_task_result(ok_result(&task.id, 5.0)).unwrap();
        assert_eq!(m.get_task(&task.id).unwrap().result, Some(5.0));

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(4.0));

        // A late error does not flip a completed expression either.
        m.update_task_result(err_result(&task.id, "division by zero"))
            .unwrap();
        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(4.0));
    }

    // ============================================================
    // TEST 6: Isolation between expressions
    // ============================================================

    #[test]
    fn test_error_does_not_leak_across_expressions() {
        let m = manager();
        let failing = m.create_expression("2/0").unwrap();
        let healthy = m.create_expression("3*3").unwrap();

        drive(&m, 50);

        assert_eq!(
            m.get_expression(&failing).unwrap().status,
            ExpressionStatus::Error
        );
        let expr = m.get_expression(&healthy).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(9.0));
    }

    // ============================================================
    // TEST 7: Full DAG evaluation
    // ============================================================

    #[test]
    fn test_four_task_expression_settles_to_eleven() {
        let m = manager();
        let id = m.create_expression("2+2*2+10/2").unwrap();
        assert_eq!(m.task_count(), 4);

        drive(&m, 100);

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(11.0));
    }

    #[test]
    fn test_evaluation_results_match_direct_computation() {
        let cases = [
            ("2+2", 4.0),
            ("5-3", 2.0),
            ("2*3", 6.0),
            ("6/2", 3.0),
            ("2+2*2", 6.0),
            ("(2+2)*2", 8.0),
            ("2+2*2+10/2", 11.0),
            ("10-2*3+1", 5.0),
            ("100/(2+3)/5", 4.0),
        ];

        for (input, want) in cases {
            let m = manager();
            let id = m.create_expression(input).unwrap();
            drive(&m, 200);

            let expr = m.get_expression(&id).unwrap();
            assert_eq!(expr.status, ExpressionStatus::Completed, "input {:?}", input);
            assert_eq!(expr.result, Some(want), "input {:?}", input);
        }
    }

    // ============================================================
    // TEST 8: Report validation
    // ============================================================

    #[test]
    fn test_report_for_unknown_task_is_rejected() {
        let m = manager();
        let outcome = m.update_task_result(ok_result(&TaskId("999".to_string()), 1.0));
        assert!(matches!(outcome, Err(SchedulerError::TaskNotFound(id)) if id == "999"));
    }

    #[test]
    fn test_expression_lookup_misses() {
        let m = manager();
        assert!(m.get_expression("999").is_none());
        assert!(m.list_expressions().is_empty());
    }

    // ============================================================
    // TEST 9: Bounded queue
    // ============================================================

    #[test]
    fn test_small_queue_never_drops_tasks() {
        // Four tasks, queue bounded to two: the overflow tasks are picked
        // up by the sweep that runs after each report.
        let m = TaskManager::new(2, OperationTimes::default());
        let id = m.create_expression("2+2*2+10/2").unwrap();
        assert_eq!(m.task_count(), 4);
        assert_eq!(m.queue_depth(), 2);

        drive(&m, 200);

        let expr = m.get_expression(&id).unwrap();
        assert_eq!(expr.status, ExpressionStatus::Completed);
        assert_eq!(expr.result, Some(11.0));
    }

    #[test]
    fn test_lease_on_empty_queue_is_none() {
        let m = manager();
        assert!(m.next_task().is_none());
    }

    // ============================================================
    // TEST 10: Concurrent submission and completion
    // ============================================================

    #[test]
    fn test_concurrent_submitters_and_workers() {
        let m = TaskManager::new(1000, OperationTimes::default());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let m = m.clone();
            handles.push(std::thread::spawn(move || {
                let mut ids = Vec::new();
                for _ in 0..25 {
                    ids.push(m.create_expression("2+2*2").unwrap());
                }
                ids
            }));
        }

        for _ in 0..4 {
            let m = m.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    if let Some(task) = m.next_task() {
                        let value = ops::evaluate(&task.operation, &task.arg1, &task.arg2)
                            .expect("leased operands are always literal");
                        m.update_task_result(ok_result(&task.id, value)).unwrap();
                    } else {
                        std::thread::yield_now();
                    }
                }
                Vec::new()
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Finish whatever the racing workers left behind.
        drive(&m, 2000);

        assert_eq!(m.expression_count(), 100);
        for expr in m.list_expressions() {
            assert_eq!(expr.status, ExpressionStatus::Completed);
            assert_eq!(expr.result, Some(6.0));
        }
    }
}
