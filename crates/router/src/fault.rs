//! 장애 관리자 -- 스트림별 장애 카운팅 및 격리
//!
//! 평가 장애(타임아웃, 비용 한도 초과)가 발생할 때마다 해당 스트림의
//! 카운터가 증가하며, 임계값을 넘으면 스트림이 격리됩니다. 격리는
//! 평가 도중이 아니라 다음 엔진 리빌드에서만 반영되므로, 진행 중인
//! 매칭의 원자성이 유지됩니다.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use metrics::gauge;

use logweir_core::metrics::ROUTER_STREAMS_QUARANTINED;

/// 스트림별 장애 카운터와 격리 상태
///
/// 내부 잠금은 짧은 임계 구역으로만 사용됩니다. 라우팅 핫패스에서는
/// 장애가 발생한 경우에만 호출됩니다.
pub struct FaultManager {
    /// 격리 임계값
    max_fault_count: u32,
    /// 스트림별 누적 장애 수
    counters: Mutex<HashMap<String, u32>>,
    /// 격리된 스트림 ID 집합
    quarantined: Mutex<HashSet<String>>,
}

impl FaultManager {
    /// 새 장애 관리자를 생성합니다.
    pub fn new(max_fault_count: u32) -> Self {
        Self {
            max_fault_count,
            counters: Mutex::new(HashMap::new()),
            quarantined: Mutex::new(HashSet::new()),
        }
    }

    /// 스트림에 평가 장애를 기록합니다.
    ///
    /// 이 호출로 임계값을 넘어 새로 격리된 경우 `true`를 반환합니다.
    /// 격리 시 카운터는 리셋됩니다.
    pub fn register_failure(&self, stream_id: &str) -> bool {
        let crossed = {
            let mut counters = self.counters.lock().expect("fault counter lock poisoned");
            let count = counters.entry(stream_id.to_owned()).or_insert(0);
            *count += 1;

            if *count >= self.max_fault_count {
                *count = 0;
                true
            } else {
                false
            }
        };

        if !crossed {
            return false;
        }

        let newly_quarantined = {
            let mut quarantined = self.quarantined.lock().expect("quarantine lock poisoned");
            quarantined.insert(stream_id.to_owned())
        };

        if newly_quarantined {
            tracing::warn!(
                stream_id,
                max_faults = self.max_fault_count,
                "stream crossed fault threshold, quarantined until cleared"
            );
            self.update_gauge();
        }

        newly_quarantined
    }

    /// 스트림이 격리되어 있는지 확인합니다.
    pub fn is_quarantined(&self, stream_id: &str) -> bool {
        self.quarantined
            .lock()
            .expect("quarantine lock poisoned")
            .contains(stream_id)
    }

    /// 격리된 스트림 ID 목록을 반환합니다.
    pub fn quarantined_ids(&self) -> Vec<String> {
        self.quarantined
            .lock()
            .expect("quarantine lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// 격리된 스트림 수를 반환합니다.
    pub fn quarantined_count(&self) -> usize {
        self.quarantined
            .lock()
            .expect("quarantine lock poisoned")
            .len()
    }

    /// 스트림의 현재 장애 카운트를 반환합니다.
    pub fn fault_count(&self, stream_id: &str) -> u32 {
        self.counters
            .lock()
            .expect("fault counter lock poisoned")
            .get(stream_id)
            .copied()
            .unwrap_or(0)
    }

    /// 스트림의 격리를 관리자 권한으로 해제합니다.
    ///
    /// 카운터도 함께 리셋되며, 다음 리빌드부터 스트림이 다시 포함됩니다.
    pub fn clear_quarantine(&self, stream_id: &str) {
        let removed = {
            let mut quarantined = self.quarantined.lock().expect("quarantine lock poisoned");
            quarantined.remove(stream_id)
        };

        self.counters
            .lock()
            .expect("fault counter lock poisoned")
            .remove(stream_id);

        if removed {
            tracing::info!(stream_id, "stream quarantine cleared");
            self.update_gauge();
        }
    }

    fn update_gauge(&self) {
        let count = self.quarantined_count();
        gauge!(ROUTER_STREAMS_QUARANTINED).set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let manager = FaultManager::new(3);
        assert_eq!(manager.fault_count("s1"), 0);
        assert!(!manager.is_quarantined("s1"));
    }

    #[test]
    fn failures_below_threshold_do_not_quarantine() {
        let manager = FaultManager::new(3);
        assert!(!manager.register_failure("s1"));
        assert!(!manager.register_failure("s1"));
        assert_eq!(manager.fault_count("s1"), 2);
        assert!(!manager.is_quarantined("s1"));
    }

    #[test]
    fn crossing_threshold_quarantines_and_resets_counter() {
        let manager = FaultManager::new(3);
        manager.register_failure("s1");
        manager.register_failure("s1");
        let crossed = manager.register_failure("s1");

        assert!(crossed);
        assert!(manager.is_quarantined("s1"));
        assert_eq!(manager.fault_count("s1"), 0);
    }

    #[test]
    fn counters_are_per_stream() {
        let manager = FaultManager::new(2);
        manager.register_failure("s1");
        manager.register_failure("s2");
        assert_eq!(manager.fault_count("s1"), 1);
        assert_eq!(manager.fault_count("s2"), 1);
        assert!(!manager.is_quarantined("s1"));
        assert!(!manager.is_quarantined("s2"));
    }

    #[test]
    fn threshold_of_one_quarantines_immediately() {
        let manager = FaultManager::new(1);
        assert!(manager.register_failure("s1"));
        assert!(manager.is_quarantined("s1"));
    }

    #[test]
    fn repeated_crossing_reports_new_quarantine_once() {
        let manager = FaultManager::new(1);
        assert!(manager.register_failure("s1"));
        // 이미 격리된 스트림의 추가 장애는 새 격리가 아님
        assert!(!manager.register_failure("s1"));
        assert_eq!(manager.quarantined_count(), 1);
    }

    #[test]
    fn clear_quarantine_resets_state() {
        let manager = FaultManager::new(2);
        manager.register_failure("s1");
        manager.register_failure("s1");
        assert!(manager.is_quarantined("s1"));

        manager.clear_quarantine("s1");
        assert!(!manager.is_quarantined("s1"));
        assert_eq!(manager.fault_count("s1"), 0);
        assert_eq!(manager.quarantined_count(), 0);
    }

    #[test]
    fn clear_unknown_stream_is_noop() {
        let manager = FaultManager::new(2);
        manager.clear_quarantine("unknown");
        assert_eq!(manager.quarantined_count(), 0);
    }

    #[test]
    fn quarantined_ids_lists_all() {
        let manager = FaultManager::new(1);
        manager.register_failure("s1");
        manager.register_failure("s2");

        let mut ids = manager.quarantined_ids();
        ids.sort();
        assert_eq!(ids, ["s1", "s2"]);
    }

    #[test]
    fn concurrent_failures_are_counted() {
        use std::sync::Arc;

        let manager = Arc::new(FaultManager::new(1000));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    manager.register_failure("shared");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.fault_count("shared"), 800);
    }
}
