mod task_status_test;
