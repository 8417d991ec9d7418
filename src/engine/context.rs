use crate::engine::combine::PartitionAssignment;
use crate::engine::map::MapperResult;
use crate::engine::reduce::ReducerOutput;
use crate::error::Phase;
use crate::{PipelineConfig, PipelineError, Word};

/// State shared by the phases of a single run.
///
/// Results live in slots pre-sized to the worker count. During a parallel
/// phase each task is handed a `&mut` to its own slot only, so no two
/// tasks ever write to the same place and no locking is needed.
#[derive(Debug)]
pub(crate) struct PipelineContext<'a> {
    pub corpus: &'a [Word],
    pub config: PipelineConfig,
    pub map_slots: Vec<Option<MapperResult>>,
    pub partitions: Vec<PartitionAssignment>,
    pub reduce_slots: Vec<Option<ReducerOutput>>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(corpus: &'a [Word], config: PipelineConfig) -> Self {
        PipelineContext {
            corpus,
            config,
            map_slots: vec![None; config.n_mappers],
            partitions: Vec::new(),
            reduce_slots: vec![None; config.m_reducers],
        }
    }

    /// Takes the mapper results out of their slots, ordered by mapper id.
    pub fn take_mapper_results(&mut self) -> Result<Vec<MapperResult>, PipelineError> {
        take_slots(Phase::Map, &mut self.map_slots)
    }

    /// Takes the reducer outputs out of their slots, ordered by reducer id.
    pub fn take_reducer_outputs(&mut self) -> Result<Vec<ReducerOutput>, PipelineError> {
        take_slots(Phase::Reduce, &mut self.reduce_slots)
    }
}

fn take_slots<T>(phase: Phase, slots: &mut [Option<T>]) -> Result<Vec<T>, PipelineError> {
    let missing = slots.iter().filter(|slot| slot.is_none()).count();
    if missing > 0 {
        return Err(PipelineError::IncompleteBarrier { phase, missing });
    }
    Ok(slots.iter_mut().filter_map(Option::take).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::map;

    #[test]
    fn slots_are_sized_to_worker_counts() {
        let ctx = PipelineContext::new(&[], PipelineConfig::new(3, 5));
        assert_eq!(ctx.map_slots.len(), 3);
        assert_eq!(ctx.reduce_slots.len(), 5);
    }

    #[test]
    fn context_keeps_the_run_config() {
        let config = PipelineConfig::new(4, 2);
        let ctx = PipelineContext::new(&[], config);
        assert_eq!(ctx.config, config);
    }

    #[test]
    fn unwritten_slot_fails_the_barrier() {
        let mut ctx = PipelineContext::new(&[], PipelineConfig::new(2, 1));
        ctx.map_slots[0] = Some(map(&[], 0));

        assert!(matches!(
            ctx.take_mapper_results(),
            Err(PipelineError::IncompleteBarrier {
                phase: Phase::Map,
                missing: 1
            })
        ));
    }

    #[test]
    fn results_come_back_in_slot_order() {
        let mut ctx = PipelineContext::new(&[], PipelineConfig::new(2, 1));
        ctx.map_slots[1] = Some(map(&[], 1));
        ctx.map_slots[0] = Some(map(&[], 0));

        let ids: Vec<_> = ctx
            .take_mapper_results()
            .unwrap()
            .into_iter()
            .map(|r| r.mapper_id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
