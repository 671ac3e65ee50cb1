use ndarray::{Array, Dimension};
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    live_tensors: AtomicUsize,
    live_bytes: AtomicUsize,
    total_allocated: AtomicUsize,
}

/// 张量内存计数器
///
/// 每个经由 [`TensorTracker::track`] 登记的数组在其句柄被释放时自动注销，
/// 因此一次分类请求结束后计数应回到请求前的基线。
#[derive(Debug, Clone, Default)]
pub struct TensorTracker {
    counters: Arc<Counters>,
}

impl TensorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个新分配的张量
    pub fn track<D: Dimension>(&self, array: Array<f32, D>) -> TrackedTensor<D> {
        let bytes = array.len() * std::mem::size_of::<f32>();
        self.counters.live_tensors.fetch_add(1, Ordering::SeqCst);
        self.counters.live_bytes.fetch_add(bytes, Ordering::SeqCst);
        self.counters.total_allocated.fetch_add(1, Ordering::SeqCst);

        TrackedTensor {
            array,
            bytes,
            counters: Arc::clone(&self.counters),
        }
    }

    /// 当前存活的张量数量
    pub fn live_tensors(&self) -> usize {
        self.counters.live_tensors.load(Ordering::SeqCst)
    }

    /// 当前存活张量占用的字节数
    pub fn live_bytes(&self) -> usize {
        self.counters.live_bytes.load(Ordering::SeqCst)
    }

    /// 累计登记过的张量数量
    pub fn total_allocated(&self) -> usize {
        self.counters.total_allocated.load(Ordering::SeqCst)
    }
}

/// 受计数器管理的张量句柄，drop 时释放登记
#[derive(Debug)]
pub struct TrackedTensor<D: Dimension> {
    array: Array<f32, D>,
    bytes: usize,
    counters: Arc<Counters>,
}

impl<D: Dimension> TrackedTensor<D> {
    pub fn array(&self) -> &Array<f32, D> {
        &self.array
    }

    pub fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    /// 取出底层数组，登记随句柄一起注销
    pub fn into_array(mut self) -> Array<f32, D> {
        std::mem::take(&mut self.array)
    }
}

impl<D: Dimension> Deref for TrackedTensor<D> {
    type Target = Array<f32, D>;

    fn deref(&self) -> &Self::Target {
        &self.array
    }
}

impl<D: Dimension> Drop for TrackedTensor<D> {
    fn drop(&mut self) {
        self.counters.live_tensors.fetch_sub(1, Ordering::SeqCst);
        self.counters.live_bytes.fetch_sub(self.bytes, Ordering::SeqCst);
    }
}
