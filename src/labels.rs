/// Random-access array of per-sample labels or regression targets.
///
/// Indexes are `usize`, so sample counts are only bounded by the address space.
pub trait Labels<T> {
    fn size(&self) -> usize;
    fn get(&self, index: usize) -> T;
}

impl<T: Copy> Labels<T> for [T] {
    fn size(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> T {
        self[index]
    }
}

impl<T: Copy> Labels<T> for Vec<T> {
    fn size(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> T {
        self[index]
    }
}

/// Panics on the first label that is not below `number_of_classes`.
pub(crate) fn assert_class_labels<L>(labels: &L, number_of_classes: usize)
where
    L: Labels<usize> + ?Sized,
{
    if let Some(i) = (0..labels.size()).find(|&i| labels.get(i) >= number_of_classes) {
        panic!(
            "label {} of sample {} is not below the number of classes ({})",
            labels.get(i),
            i,
            number_of_classes
        );
    }
}

/// Number of classes implied by class labels `0..=max`.
pub fn number_of_classes<L>(labels: &L) -> usize
where
    L: Labels<usize> + ?Sized,
{
    (0..labels.size())
        .map(|i| labels.get(i) + 1)
        .max()
        .unwrap_or(0)
}
