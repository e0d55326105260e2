mod context_aggregator_test;
mod prompt_assembler_test;
