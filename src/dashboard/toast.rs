use std::time::{Duration, Instant};

pub const TOAST_VISIBLE: Duration = Duration::from_millis(3000);
pub const TOAST_FADE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Shown,
    Removing,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    created: Instant,
}

impl Toast {
    pub fn phase(&self, now: Instant) -> Option<ToastPhase> {
        let age = now.saturating_duration_since(self.created);
        if age < TOAST_VISIBLE {
            Some(ToastPhase::Shown)
        } else if age < TOAST_VISIBLE + TOAST_FADE {
            Some(ToastPhase::Removing)
        } else {
            None
        }
    }

    /// Time left before the fade starts.
    pub fn remaining(&self, now: Instant) -> Duration {
        TOAST_VISIBLE.saturating_sub(now.saturating_duration_since(self.created))
    }
}

/// Stacked notifications; no dedup and no cap.
#[derive(Debug, Default)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
            created: now,
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops every toast whose fade has finished.
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|t| t.phase(now).is_some());
    }

    pub fn active(&self, now: Instant) -> impl Iterator<Item = (&Toast, ToastPhase)> {
        self.toasts
            .iter()
            .filter_map(move |t| t.phase(now).map(|phase| (t, phase)))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_fades_then_disappears() {
        let t0 = Instant::now();
        let mut q = ToastQueue::default();
        q.push("Paciente agregado correctamente", ToastKind::Success, t0);

        let phases = |q: &ToastQueue, at| q.active(at).map(|(_, p)| p).collect::<Vec<_>>();
        assert_eq!(phases(&q, t0 + Duration::from_millis(2999)), [ToastPhase::Shown]);
        assert_eq!(phases(&q, t0 + Duration::from_millis(3000)), [ToastPhase::Removing]);
        assert!(phases(&q, t0 + Duration::from_millis(3300)).is_empty());

        q.prune(t0 + Duration::from_millis(3100));
        assert_eq!(q.len(), 1);
        q.prune(t0 + Duration::from_millis(3300));
        assert!(q.is_empty());
    }

    #[test]
    fn toasts_stack_without_dedup() {
        let t0 = Instant::now();
        let mut q = ToastQueue::default();
        let a = q.push("hola", ToastKind::Success, t0);
        let b = q.push("hola", ToastKind::Error, t0 + Duration::from_secs(1));
        assert_ne!(a, b);
        assert_eq!(q.active(t0 + Duration::from_secs(1)).count(), 2);

        // first one is gone, second still shown
        let later: Vec<_> = q.active(t0 + Duration::from_millis(3500)).collect();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].0.kind, ToastKind::Error);
    }

    #[test]
    fn dismiss_removes_only_that_toast() {
        let t0 = Instant::now();
        let mut q = ToastQueue::default();
        let a = q.push("uno", ToastKind::Success, t0);
        q.push("dos", ToastKind::Success, t0);
        assert!(q.dismiss(a));
        assert!(!q.dismiss(a));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let t0 = Instant::now();
        let mut q = ToastQueue::default();
        q.push("x", ToastKind::Success, t0);
        let (toast, _) = q.active(t0).next().unwrap();
        assert_eq!(toast.remaining(t0 + Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(toast.remaining(t0 + Duration::from_secs(5)), Duration::ZERO);
    }
}
