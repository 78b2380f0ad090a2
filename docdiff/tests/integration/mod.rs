mod faults_test;
mod pipeline_test;
